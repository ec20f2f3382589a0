use strum::Display;

use demo_wallet::domain::{
    models::{RemoteWallet, Transaction, TransactionDetail, TransferQuote, User, Wallet},
    session::{BalanceView, ProfileView, Route, SendDraft, SessionError},
};

/// A failed background task, reduced to what the UI shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// The session is gone and the user has to log in again.
    pub expired: bool,
}

impl From<SessionError> for Failure {
    fn from(err: SessionError) -> Self {
        Self {
            message: err.user_message(),
            expired: err.is_session_expired(),
        }
    }
}

pub type Outcome<T> = Result<T, Failure>;

/// Actions triggered by user input, timers, or finished background tasks.
///
/// Request actions carry no form data: the app reads the inputs from the
/// component that raised them, so secrets never travel through the queue.
#[derive(Debug, Clone, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Quit,
    Error(String),

    // Navigation
    Navigate(Route),

    // Auth
    Login,
    Signup,
    Logout,
    LoggedIn(Outcome<Route>),
    LoggedOut,

    // Wallet setup
    GenerateWallet,
    SaveGeneratedWallet,
    ImportWallet,
    WalletReady(Outcome<Wallet>),

    // Dashboard
    RefreshBalance,
    BalanceLoaded(Outcome<BalanceView>),
    PriceLoaded(f64),

    // Send
    ReviewSend,
    QuoteReady(Outcome<(SendDraft, TransferQuote)>),
    ConfirmSend,
    CancelSend,
    SendCompleted(Outcome<Transaction>),

    // History
    LoadTransactionDetails(usize),
    TransactionDetailsLoaded(Outcome<TransactionDetail>),

    // Wallets
    LoadWallets,
    WalletsLoaded(Outcome<Vec<RemoteWallet>>),
    CreateRemoteWallet,
    ImportRemoteWallet,
    RemoteWalletAdded(Outcome<String>),
    SelectWallet(usize),

    // Profile
    LoadProfile,
    ProfileLoaded(Outcome<ProfileView>),
    SaveProfile,
    ProfileSaved(Outcome<User>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use demo_wallet::infra::api::ApiError;

    #[test]
    fn test_failure_from_session_error() {
        let failure = Failure::from(SessionError::InsufficientBalance);
        assert_eq!(failure.message, "Insufficient balance");
        assert!(!failure.expired);

        let failure = Failure::from(SessionError::Api(ApiError::SessionExpired));
        assert!(failure.expired);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::ReviewSend.to_string(), "review_send");
        assert_eq!(Action::LoadTransactionDetails(3).to_string(), "load_transaction_details");
    }
}
