use std::path::PathBuf;

use color_eyre::eyre::Result;
use heed::{byteorder::BE, types::*, Database, Env, EnvOpenOptions};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::get_data_dir,
    domain::models::{AuthTokens, Transaction, User, Wallet},
};

const SESSION_DB: &str = "session";
const TRANSACTIONS_DB: &str = "transactions";

const CURRENT_USER_KEY: &str = "currentUser";
const WALLET_KEY: &str = "wallet";
const AUTH_TOKENS_KEY: &str = "auth_tokens";

type TransactionsDb = Database<U64<BE>, SerdeRmp<Transaction>>;

/// Wrapper around LMDB database for persistent storage.
#[derive(Clone)]
pub struct Store {
    env: Env,
}

impl Store {
    pub fn new() -> Result<Self> {
        Self::with_path(get_data_dir().join("wallet.mdb"))
    }

    pub fn with_path(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(16 * 1024 * 1024) // 16MB
                .max_dbs(4)
                .open(path)?
        };
        Ok(Self { env })
    }

    fn put<T: Serialize + 'static>(&self, key: &str, value: &T) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: Database<Str, SerdeRmp<T>> =
            self.env.create_database(&mut wtxn, Some(SESSION_DB))?;
        db.put(&mut wtxn, key, value)?;
        wtxn.commit()?;
        Ok(())
    }

    fn get<T: DeserializeOwned + 'static>(&self, key: &str) -> Result<Option<T>> {
        let rtxn = self.env.read_txn()?;
        let db: Option<Database<Str, SerdeRmp<T>>> =
            self.env.open_database(&rtxn, Some(SESSION_DB))?;

        match db {
            Some(db) => Ok(db.get(&rtxn, key)?),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: Database<Str, Bytes> = self.env.create_database(&mut wtxn, Some(SESSION_DB))?;
        db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<User>> {
        self.get(CURRENT_USER_KEY)
    }

    pub fn set_current_user(&self, user: &User) -> Result<()> {
        self.put(CURRENT_USER_KEY, user)
    }

    pub fn clear_current_user(&self) -> Result<()> {
        self.delete(CURRENT_USER_KEY)
    }

    pub fn wallet(&self) -> Result<Option<Wallet>> {
        self.get(WALLET_KEY)
    }

    pub fn set_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.put(WALLET_KEY, wallet)
    }

    pub fn clear_wallet(&self) -> Result<()> {
        self.delete(WALLET_KEY)
    }

    pub fn auth_tokens(&self) -> Result<Option<AuthTokens>> {
        self.get(AUTH_TOKENS_KEY)
    }

    pub fn set_auth_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.put(AUTH_TOKENS_KEY, tokens)
    }

    /// All transactions, newest first.
    pub fn transactions(&self) -> Result<Vec<Transaction>> {
        let rtxn = self.env.read_txn()?;
        let db: Option<TransactionsDb> = self.env.open_database(&rtxn, Some(TRANSACTIONS_DB))?;

        match db {
            Some(db) => {
                let mut txs = Vec::new();
                for result in db.rev_iter(&rtxn)? {
                    let (_, tx) = result?;
                    txs.push(tx);
                }
                Ok(txs)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Record a transaction at the head of the history.
    pub fn add_transaction(&self, tx: &Transaction) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let db: TransactionsDb = self.env.create_database(&mut wtxn, Some(TRANSACTIONS_DB))?;
        let next = match db.last(&wtxn)? {
            Some((seq, _)) => seq + 1,
            None => 0,
        };
        db.put(&mut wtxn, &next, tx)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Wipe the user, wallet, tokens and history.
    pub fn clear_all(&self) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        let session: Database<Str, Bytes> =
            self.env.create_database(&mut wtxn, Some(SESSION_DB))?;
        session.clear(&mut wtxn)?;
        let txs: TransactionsDb = self.env.create_database(&mut wtxn, Some(TRANSACTIONS_DB))?;
        txs.clear(&mut wtxn)?;
        wtxn.commit()?;
        Ok(())
    }
}
