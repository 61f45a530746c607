use algosign_core::types::{Account, Address};
use auto_impl::auto_impl;
use std::{collections::HashMap, fmt::Debug};

/// Looks up the accounts known to the wallet
#[auto_impl(&, Box, Arc)]
pub trait AccountDirectory: Debug + Send + Sync {
    fn account(&self, address: &Address) -> Option<Account>;
}

/// An in-memory [`AccountDirectory`]
#[derive(Clone, Debug, Default)]
pub struct AccountCache {
    accounts: HashMap<Address, Account>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an account
    pub fn insert(&mut self, account: Account) -> Option<Account> {
        self.accounts.insert(account.address, account)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        self.accounts.remove(address)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountDirectory for AccountCache {
    fn account(&self, address: &Address) -> Option<Account> {
        self.accounts.get(address).cloned()
    }
}

impl FromIterator<Account> for AccountCache {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self { accounts: iter.into_iter().map(|account| (account.address, account)).collect() }
    }
}

impl Extend<Account> for AccountCache {
    fn extend<I: IntoIterator<Item = Account>>(&mut self, iter: I) {
        self.accounts.extend(iter.into_iter().map(|account| (account.address, account)))
    }
}
