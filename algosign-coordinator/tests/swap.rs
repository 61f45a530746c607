use algosign_coordinator::{
    AccountCache, CoordinatorEvent, SignError, SignResult, SwapQuoteShape, SwapSigner,
};
use algosign_core::types::{
    Account, LedgerDetail, LedgerDevice, SignedTransaction, SwapQuoteTransaction,
    SwapTransactionPurpose, TxIndex, UnsignedTransactionData,
};
use algosign_signers::{
    ledger::mock::{MockLedger, MockLedgerResponse},
    Keyring, LocalWallet,
};

fn quote(legs: &[usize], signer: algosign_core::types::Address) -> Vec<SwapQuoteTransaction> {
    let purposes = [SwapTransactionPurpose::OptIn, SwapTransactionPurpose::Swap];
    legs.iter()
        .enumerate()
        .map(|(parent, len)| {
            let transactions = (0..*len)
                .map(|i| {
                    UnsignedTransactionData::new(parent, i, vec![0x80, parent as u8, i as u8])
                        .signer(signer)
                })
                .collect();
            SwapQuoteTransaction::new(purposes[parent % 2], transactions)
        })
        .collect()
}

#[tokio::test]
async fn inserts_results_into_their_groups() {
    let wallet = LocalWallet::from_seed([3; 32]);
    let address = wallet.address();
    let accounts: AccountCache = vec![Account::standard(address, "main")].into_iter().collect();
    let keyring: Keyring = vec![wallet].into_iter().collect();
    let signer = SwapSigner::new(SwapQuoteShape, keyring, accounts, MockLedger::new());
    let mut events = signer.subscribe();

    let input = quote(&[2, 1], address);
    let groups = match signer.sign_swap_quote_transactions(input.clone()).await {
        SignResult::Success(groups) => groups,
        other => panic!("expected success, got {other:?}"),
    };

    let mut inserted = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoordinatorEvent::TransactionSigned { index, .. } = event {
            inserted.push(index);
        }
    }
    assert_eq!(inserted, vec![TxIndex::new(0, 0), TxIndex::new(0, 1), TxIndex::new(1, 0)]);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].purpose, SwapTransactionPurpose::OptIn);
    assert_eq!(groups[1].purpose, SwapTransactionPurpose::Swap);
    for (group, original) in groups.iter().zip(&input) {
        assert!(group.is_fully_signed());
        assert_eq!(group.transactions, original.transactions);
        for (i, blob) in group.signed_transactions().iter().enumerate() {
            let envelope = SignedTransaction::decode(blob).unwrap();
            envelope.sig.verify(original.transactions[i].bytes_to_sign(), &address).unwrap();
        }
    }
}

#[tokio::test]
async fn ledger_swap_rejection_fails_the_quote() {
    let address = MockLedger::address_for(2);
    let detail =
        LedgerDetail { device: LedgerDevice::new("Nano X", "AA:BB"), account_index: 2 };
    let accounts: AccountCache =
        vec![Account::ledger(address, "ledger", detail)].into_iter().collect();
    let ledger = MockLedger::new();
    ledger.push_response(MockLedgerResponse::Reject);
    let signer = SwapSigner::new(SwapQuoteShape, Keyring::new(), accounts, ledger.clone());

    let result = signer.sign_swap_quote_transactions(quote(&[1, 2], address)).await;
    assert!(matches!(
        result,
        SignResult::Failure(SignError::HardwareRejected { index }) if index == TxIndex::new(0, 0)
    ));
    assert_eq!(ledger.requests().len(), 1);

    // retrying from scratch signs all three on the device
    let groups =
        signer.sign_swap_quote_transactions(quote(&[1, 2], address)).await.into_result().unwrap();
    assert!(groups.iter().all(SwapQuoteTransaction::is_fully_signed));
    assert_eq!(ledger.requests().len(), 4);
}

#[tokio::test]
async fn misplaced_transactions_fail_before_the_device_prompts() {
    let address = MockLedger::address_for(0);
    let detail =
        LedgerDetail { device: LedgerDevice::new("Nano X", "AA:BB"), account_index: 0 };
    let accounts: AccountCache =
        vec![Account::ledger(address, "ledger", detail)].into_iter().collect();
    let ledger = MockLedger::new();
    let signer = SwapSigner::new(SwapQuoteShape, Keyring::new(), accounts, ledger.clone());

    // a one transaction leg whose only entry claims the second slot
    let leg = SwapQuoteTransaction::new(
        SwapTransactionPurpose::Swap,
        vec![UnsignedTransactionData::new(0, 1, vec![0x80]).signer(address)],
    );
    let result = signer.sign_swap_quote_transactions(vec![leg]).await;
    assert!(matches!(result, SignResult::Failure(SignError::InvalidBatch(_))));

    // two legs claiming the same group
    let legs = vec![
        SwapQuoteTransaction::new(
            SwapTransactionPurpose::OptIn,
            vec![UnsignedTransactionData::new(0, 0, vec![0x81]).signer(address)],
        ),
        SwapQuoteTransaction::new(
            SwapTransactionPurpose::Swap,
            vec![UnsignedTransactionData::new(0, 0, vec![0x82]).signer(address)],
        ),
    ];
    let err = signer.sign_swap_quote_transactions(legs).await.into_result().unwrap_err();
    assert!(err.to_string().contains("appears more than once"));

    assert!(ledger.requests().is_empty());
    assert_eq!(signer.state(), algosign_coordinator::CoordinatorState::Idle);
}
