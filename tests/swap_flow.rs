use algosign::prelude::*;
use std::sync::Arc;

/// A quote whose opt-in is signed in the app, and whose swap and fee legs come from a
/// Ledger account rekeyed from the app's hot wallet
#[tokio::test]
async fn mixed_swap_quote_end_to_end() {
    let hot = LocalWallet::from_seed([42; 32]);
    let hot_address = hot.address();
    let ledger_address = MockLedger::address_for(3);
    let vault: Address = Address::new([77; 32]);
    let device = LedgerDevice::new("Nano X 9F00", "D4:F5:13:00:00:09");

    let accounts: AccountCache = vec![
        Account::standard(hot_address, "hot"),
        Account::ledger(
            ledger_address,
            "cold",
            LedgerDetail { device: device.clone(), account_index: 3 },
        ),
        Account::rekeyed(vault, "vault", ledger_address),
    ]
    .into_iter()
    .collect();
    let keyring: Keyring = vec![hot].into_iter().collect();
    let ledger = MockLedger::new();
    let reply = ledger.hold();

    let signer = Arc::new(SwapSigner::new(SwapQuoteShape, keyring, accounts, ledger.clone()));
    let mut events = signer.subscribe();

    let quote = vec![
        SwapQuoteTransaction::new(
            SwapTransactionPurpose::OptIn,
            vec![UnsignedTransactionData::new(0, 0, vec![0x81, 0x01]).signer(hot_address)],
        ),
        SwapQuoteTransaction::new(
            SwapTransactionPurpose::Swap,
            vec![
                UnsignedTransactionData::new(1, 0, vec![0x82, 0x01]).signer(vault),
                // the pool's side of the atomic group
                UnsignedTransactionData::new(1, 1, vec![0x82, 0x02]),
                UnsignedTransactionData::new(1, 2, vec![0x82, 0x03]).signer(vault),
            ],
        ),
    ];

    let pending = {
        let signer = signer.clone();
        let quote = quote.clone();
        tokio::spawn(async move { signer.sign_swap_quote_transactions(quote).await })
    };

    // the first Ledger prompt only shows up after the app signed the opt-in
    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.unwrap();
        seen.push(event.clone());
        if let CoordinatorEvent::AwaitingLedgerApproval { index, device: shown, .. } = event {
            assert_eq!(index, TxIndex::new(1, 0));
            assert_eq!(shown, device);
            break
        }
    }
    assert!(seen
        .iter()
        .any(|e| matches!(e, CoordinatorEvent::TransactionSigned { index, .. } if *index == TxIndex::new(0, 0))));
    assert!(reply.approve());

    let groups = pending.await.unwrap().into_result().unwrap();
    assert!(groups.iter().all(SwapQuoteTransaction::is_fully_signed));
    assert_eq!(ledger.request_indices(), vec![TxIndex::new(1, 0), TxIndex::new(1, 2)]);
    assert!(ledger.requests().iter().all(|request| request.derivation_path() == "m/44'/283'/3'/0/0"));

    let opt_in = SignedTransaction::decode(groups[0].signed(0).unwrap().signed.as_ref().unwrap()).unwrap();
    opt_in.sig.verify(quote[0].transactions[0].bytes_to_sign(), &hot_address).unwrap();
    assert_eq!(opt_in.sgnr, None);

    let swap = &groups[1];
    assert!(swap.signed(1).unwrap().is_skipped());
    assert_eq!(swap.signed_transactions().len(), 2);
    for i in [0, 2] {
        let envelope =
            SignedTransaction::decode(swap.signed(i).unwrap().signed.as_ref().unwrap()).unwrap();
        assert_eq!(envelope.sgnr, Some(ledger_address));
        envelope.sig.verify(quote[1].transactions[i].bytes_to_sign(), &ledger_address).unwrap();
    }
}

#[tokio::test]
async fn config_from_json() {
    let config: CoordinatorConfig =
        serde_json::from_str(r#"{ "ledger_timeout_ms": 120000, "event_capacity": 64 }"#).unwrap();
    let coordinator = SigningCoordinator::with_config(
        FlatShape,
        Keyring::new(),
        AccountCache::new(),
        MockLedger::new(),
        config,
    );
    assert_eq!(coordinator.config().ledger_timeout, Some(std::time::Duration::from_secs(120)));
    assert_eq!(coordinator.config().queue_policy, QueuePolicy::HaltOnFailure);
    assert_eq!(coordinator.state(), CoordinatorState::Idle);
}
