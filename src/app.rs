use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
};
use strum::Display;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use demo_wallet::{
    config::{Backend, Config},
    domain::{
        models::{now_millis, Wallet},
        session::{Route, SessionManager},
        wallet::format_address,
    },
    infra::{
        api::{MockApi, RestApi, WalletApi},
        store::Store,
    },
};

use crate::{
    action::{Action, Failure},
    cli::Args,
    components::{
        dashboard::{DashboardComponent, RECENT_LIMIT},
        history::HistoryComponent,
        login::LoginComponent,
        profile::ProfileComponent,
        receive::ReceiveComponent,
        send::SendComponent,
        signup::SignupComponent,
        wallet_setup::WalletSetupComponent,
        wallets::WalletsComponent,
        Component,
    },
    tui::{Event, Tui},
};

/// How long a notification stays in the status bar.
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Signup,
    WalletSetup,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Send,
    Receive,
    History,
    Wallets,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Dashboard,
        Tab::Send,
        Tab::Receive,
        Tab::History,
        Tab::Wallets,
        Tab::Profile,
    ];

    pub fn title(&self) -> Line<'static> {
        let hot = |s: &'static str| {
            Span::styled(
                s,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        };
        match self {
            Tab::Dashboard => Line::from(vec![hot("D"), Span::raw("ashboard")]),
            Tab::Send => Line::from(vec![hot("S"), Span::raw("end")]),
            Tab::Receive => Line::from(vec![Span::raw("Recei"), hot("v"), Span::raw("e")]),
            Tab::History => Line::from(vec![hot("H"), Span::raw("istory")]),
            Tab::Wallets => Line::from(vec![hot("W"), Span::raw("allets")]),
            Tab::Profile => Line::from(vec![hot("P"), Span::raw("rofile")]),
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Tab {
        Self::ALL.get(index).copied().unwrap_or(Tab::Dashboard)
    }

    pub fn route(&self) -> Route {
        match self {
            Tab::Dashboard => Route::Dashboard,
            Tab::Send => Route::Send,
            Tab::Receive => Route::Receive,
            Tab::History => Route::History,
            Tab::Wallets => Route::Wallets,
            Tab::Profile => Route::Profile,
        }
    }

    pub fn from_route(route: Route) -> Option<Tab> {
        match route {
            Route::Dashboard => Some(Tab::Dashboard),
            Route::Send => Some(Tab::Send),
            Route::Receive => Some(Tab::Receive),
            Route::History => Some(Tab::History),
            Route::Wallets => Some(Tab::Wallets),
            Route::Profile => Some(Tab::Profile),
            Route::Login | Route::Signup | Route::WalletSetup => None,
        }
    }

    fn from_hotkey(c: char) -> Option<Tab> {
        match c {
            'd' => Some(Tab::Dashboard),
            's' => Some(Tab::Send),
            'v' => Some(Tab::Receive),
            'h' => Some(Tab::History),
            'w' => Some(Tab::Wallets),
            'p' => Some(Tab::Profile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    fn color(self) -> Color {
        match self {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
            NotificationKind::Info => Color::Cyan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
}

pub struct App {
    pub should_quit: bool,
    pub should_suspend: bool,
    pub config: Config,
    pub screen: Screen,
    pub active_tab: Tab,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
    pub tui: Tui,
    pub session: SessionManager,
    pub login_component: LoginComponent,
    pub signup_component: SignupComponent,
    pub wallet_setup_component: WalletSetupComponent,
    pub dashboard_component: DashboardComponent,
    pub send_component: SendComponent,
    pub receive_component: ReceiveComponent,
    pub history_component: HistoryComponent,
    pub wallets_component: WalletsComponent,
    pub profile_component: ProfileComponent,
    pub status_message: String,
    pub notification: Option<Notification>,
    /// Display name of the signed-in user, for the header.
    pub user_label: Option<String>,
    pub eth_price: f64,
}

impl App {
    pub fn new(args: &Args) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let config = Config::load(args.backend.as_deref(), args.api_url.as_deref())?;
        let store = Store::new()?;

        let api: Arc<dyn WalletApi> = match config.api.backend {
            Backend::Mock => Arc::new(
                MockApi::new(Duration::from_millis(config.api.mock_delay_ms))
                    .with_expiry(Duration::from_secs(config.transfer.expiry_secs))
                    .with_eth_price(config.transfer.fallback_eth_price),
            ),
            Backend::Rest => Arc::new(RestApi::new(&config.api, store.clone())?),
        };
        info!("Using {} backend", config.api.backend);

        let session = SessionManager::new(store, api, config.transfer.clone());
        let eth_price = config.transfer.fallback_eth_price;

        let tui = Tui::new()?
            .tick_rate(args.tick_rate)
            .frame_rate(args.frame_rate)
            .paste(true);

        Ok(Self {
            should_quit: false,
            should_suspend: false,
            screen: Screen::Login,
            active_tab: Tab::Dashboard,
            login_component: LoginComponent::new(action_tx.clone()),
            signup_component: SignupComponent::new(action_tx.clone()),
            wallet_setup_component: WalletSetupComponent::new(action_tx.clone()),
            dashboard_component: DashboardComponent::new(action_tx.clone(), eth_price),
            send_component: SendComponent::new(action_tx.clone(), eth_price),
            receive_component: ReceiveComponent::new(),
            history_component: HistoryComponent::new(action_tx.clone()),
            wallets_component: WalletsComponent::new(action_tx.clone(), eth_price),
            profile_component: ProfileComponent::new(action_tx.clone()),
            config,
            action_tx,
            action_rx,
            tui,
            session,
            status_message: "Ready".to_string(),
            notification: None,
            user_label: None,
            eth_price,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.tui.enter()?;

        // Resume the stored session, or land on the login screen
        self.navigate(Route::Dashboard)?;

        loop {
            if let Some(event) = self.tui.next().await {
                self.handle_event(event).await?;
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.handle_action(action).await?;
            }

            if self.should_suspend {
                self.tui.suspend()?;
                self.should_suspend = false;
                self.tui.resume()?;
            }

            if self.should_quit {
                break;
            }
        }

        self.tui.exit()?;
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => {
                self.action_tx.send(Action::Tick)?;
            }
            Event::Render => {
                self.draw_ui()?;
            }
            Event::Key(key_event) => {
                self.handle_key_event(key_event)?;
            }
            Event::Resize(w, h) => {
                self.action_tx.send(Action::Resize(w, h))?;
            }
            Event::Init => {
                info!("Application initialized");
            }
            Event::Paste(text) => {
                self.handle_paste(&text);
            }
            Event::Error | Event::FocusGained | Event::FocusLost => {}
        }
        Ok(())
    }

    /// Whether the visible component wants every key, including tab hotkeys.
    fn captures_input(&self) -> bool {
        match self.screen {
            Screen::Login | Screen::Signup | Screen::WalletSetup => true,
            Screen::Main => match self.active_tab {
                Tab::Send => self.send_component.captures_input(),
                Tab::Wallets => self.wallets_component.captures_input(),
                Tab::Profile => self.profile_component.is_editing,
                Tab::Dashboard | Tab::Receive | Tab::History => false,
            },
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.action_tx.send(Action::Quit)?,
                KeyCode::Char('z') => self.action_tx.send(Action::Suspend)?,
                _ => {}
            }
            return Ok(());
        }

        if self.captures_input() {
            return self.forward_key(key);
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.action_tx.send(Action::Quit)?;
            }
            KeyCode::Char(c) if Tab::from_hotkey(c).is_some() => {
                if let Some(tab) = Tab::from_hotkey(c) {
                    self.navigate(tab.route())?;
                }
            }
            KeyCode::Tab => {
                let next = Tab::from_index((self.active_tab.index() + 1) % Tab::ALL.len());
                self.navigate(next.route())?;
            }
            KeyCode::BackTab => {
                let len = Tab::ALL.len();
                let prev = Tab::from_index((self.active_tab.index() + len - 1) % len);
                self.navigate(prev.route())?;
            }
            _ => self.forward_key(key)?,
        }
        Ok(())
    }

    fn forward_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.screen {
            Screen::Login => self.login_component.handle_key_event(key),
            Screen::Signup => self.signup_component.handle_key_event(key),
            Screen::WalletSetup => self.wallet_setup_component.handle_key_event(key),
            Screen::Main => match self.active_tab {
                Tab::Dashboard => self.dashboard_component.handle_key_event(key),
                Tab::Send => self.send_component.handle_key_event(key),
                Tab::Receive => self.receive_component.handle_key_event(key),
                Tab::History => self.history_component.handle_key_event(key),
                Tab::Wallets => self.wallets_component.handle_key_event(key),
                Tab::Profile => self.profile_component.handle_key_event(key),
            },
        }
    }

    fn handle_paste(&mut self, text: &str) {
        match self.screen {
            Screen::Login => self.login_component.paste(text),
            Screen::Signup => self.signup_component.paste(text),
            Screen::WalletSetup => self.wallet_setup_component.paste(text),
            Screen::Main => match self.active_tab {
                Tab::Send => self.send_component.paste(text),
                Tab::Wallets => self.wallets_component.paste(text),
                Tab::Profile => self.profile_component.paste(text),
                _ => {}
            },
        }
    }

    /// Run a session call in the background and feed its result back as an action.
    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(SessionManager) -> Fut,
        Fut: Future<Output = Action> + Send + 'static,
    {
        let fut = task(self.session.clone());
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = fut.await;
            if tx.send(action).is_err() {
                debug!("Dropping task result, app has shut down");
            }
        });
    }

    fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let message = message.into();
        debug!("{} notification: {}", kind, message);
        self.notification = Some(Notification {
            kind,
            message,
            expires_at: Instant::now() + NOTIFICATION_TTL,
        });
    }

    /// Report a failed task. Returns true when the session expired and the
    /// user has been sent back to the login screen.
    fn report_failure(&mut self, failure: &Failure) -> Result<bool> {
        if failure.expired {
            warn!("Session expired, returning to login");
            // The login screen is only reachable with nothing stored
            self.session.end_expired_session()?;
            self.reset_session_views();
            self.navigate(Route::Login)?;
            self.notify(NotificationKind::Error, failure.message.clone());
            return Ok(true);
        }
        self.notify(NotificationKind::Error, failure.message.clone());
        Ok(false)
    }

    /// Drop everything shown for the previous user.
    fn reset_session_views(&mut self) {
        let tx = self.action_tx.clone();
        let price = self.eth_price;
        self.login_component.reset();
        self.signup_component.reset();
        self.wallet_setup_component.reset();
        self.dashboard_component = DashboardComponent::new(tx.clone(), price);
        self.send_component = SendComponent::new(tx.clone(), price);
        self.receive_component = ReceiveComponent::new();
        self.history_component = HistoryComponent::new(tx.clone());
        self.wallets_component = WalletsComponent::new(tx.clone(), price);
        self.profile_component = ProfileComponent::new(tx);
        self.user_label = None;
    }

    /// Push the stored user and wallet into the components that show them.
    fn sync_session(&mut self) -> Result<Option<Wallet>> {
        self.user_label = self.session.current_user()?.map(|u| u.display_name());
        let wallet = self.session.wallet()?;
        let same_address = self.dashboard_component.wallet.as_ref().map(|w| &w.address)
            == wallet.as_ref().map(|w| &w.address);
        if same_address {
            self.dashboard_component.wallet = wallet.clone();
        } else {
            self.dashboard_component.set_wallet(wallet.clone());
        }
        self.send_component.set_wallet(wallet.clone());
        self.receive_component.set_wallet(wallet.clone());
        self.wallets_component.active_address = wallet.as_ref().map(|w| w.address.clone());
        Ok(wallet)
    }

    fn set_eth_price(&mut self, price: f64) {
        self.eth_price = price;
        self.dashboard_component.eth_price = price;
        self.send_component.eth_price = price;
        self.wallets_component.eth_price = price;
    }

    fn navigate(&mut self, route: Route) -> Result<()> {
        let route = match self.session.route_guard(route) {
            Ok(route) => route,
            Err(e) => {
                warn!("Route guard failed: {}", e);
                Route::Login
            }
        };
        debug!("Navigating to {:?}", route);

        match route {
            Route::Login => {
                self.login_component.reset();
                self.screen = Screen::Login;
            }
            Route::Signup => {
                self.signup_component.reset();
                self.screen = Screen::Signup;
            }
            Route::WalletSetup => {
                self.sync_session()?;
                self.wallet_setup_component.reset();
                self.screen = Screen::WalletSetup;
            }
            other => {
                if let Some(tab) = Tab::from_route(other) {
                    self.screen = Screen::Main;
                    self.active_tab = tab;
                    self.enter_tab(tab)?;
                }
            }
        }
        Ok(())
    }

    /// Load what a tab shows when it becomes visible.
    fn enter_tab(&mut self, tab: Tab) -> Result<()> {
        self.sync_session()?;
        match tab {
            Tab::Dashboard => {
                self.dashboard_component
                    .set_recent(self.session.recent_transactions(RECENT_LIMIT)?);
                self.action_tx.send(Action::RefreshBalance)?;
            }
            Tab::Send | Tab::Receive => {}
            Tab::History => {
                self.history_component
                    .set_transactions(self.session.transactions()?);
            }
            Tab::Wallets => {
                self.action_tx.send(Action::LoadWallets)?;
            }
            Tab::Profile => {
                if self.profile_component.user.is_none() {
                    if let Some(user) = self.session.current_user()? {
                        self.profile_component.set_user(user, false);
                    }
                }
                if !self.profile_component.is_editing {
                    self.action_tx.send(Action::LoadProfile)?;
                }
            }
        }
        Ok(())
    }

    async fn handle_action(&mut self, action: Action) -> Result<()> {
        if !matches!(action, Action::Tick | Action::Render) {
            debug!("Handling action: {}", action);
        }
        match action {
            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|n| Instant::now() >= n.expires_at)
                {
                    self.notification = None;
                }
                if self.send_component.expire_review(now_millis()) {
                    self.notify(NotificationKind::Error, "Transaction expired");
                }
            }
            Action::Render => {
                self.draw_ui()?;
            }
            Action::Resize(w, h) => {
                self.tui.resize(Rect::new(0, 0, w, h))?;
                self.draw_ui()?;
            }
            Action::Suspend => {
                self.should_suspend = true;
            }
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Error(msg) => {
                self.notify(NotificationKind::Error, msg);
            }
            Action::Navigate(route) => {
                self.navigate(route)?;
            }

            // Auth
            Action::Login => {
                let email = self.login_component.email.clone();
                let password = self.login_component.password.clone();
                self.status_message = "Logging in...".to_string();
                self.spawn(move |s| async move {
                    Action::LoggedIn(s.login(&email, &password).await.map_err(Failure::from))
                });
            }
            Action::Signup => {
                let email = self.signup_component.email.clone();
                let username = self.signup_component.username.clone();
                let password = self.signup_component.password.clone();
                let confirm = self.signup_component.confirm_password.clone();
                self.status_message = "Creating account...".to_string();
                self.spawn(move |s| async move {
                    Action::LoggedIn(
                        s.signup(&email, &username, &password, &confirm)
                            .await
                            .map_err(Failure::from),
                    )
                });
            }
            Action::LoggedIn(result) => {
                self.status_message = "Ready".to_string();
                match result {
                    Ok(route) => {
                        self.login_component.reset();
                        self.signup_component.reset();
                        self.sync_session()?;
                        if let Some(name) = self.user_label.clone() {
                            self.notify(NotificationKind::Success, format!("Welcome, {}", name));
                        }
                        self.navigate(route)?;
                    }
                    Err(failure) => {
                        if self.screen == Screen::Signup {
                            self.signup_component.is_loading = false;
                            self.signup_component.error_message = Some(failure.message);
                        } else {
                            self.login_component.is_loading = false;
                            self.login_component.error_message = Some(failure.message);
                        }
                    }
                }
            }
            Action::Logout => {
                self.status_message = "Logging out...".to_string();
                self.spawn(|s| async move {
                    if let Err(e) = s.logout().await {
                        warn!("Logout failed: {}", e);
                        return Action::Error(e.user_message());
                    }
                    Action::LoggedOut
                });
            }
            Action::LoggedOut => {
                self.status_message = "Ready".to_string();
                self.reset_session_views();
                self.navigate(Route::Login)?;
                self.notify(NotificationKind::Info, "Logged out");
            }

            // Wallet setup
            Action::GenerateWallet => match self.session.create_wallet() {
                Ok(wallet) => self.wallet_setup_component.show_generated(wallet),
                Err(e) => self.wallet_setup_component.error_message = Some(e.user_message()),
            },
            Action::SaveGeneratedWallet => {
                if let Some(wallet) = self.wallet_setup_component.pending_wallet.clone() {
                    self.spawn(move |s| async move {
                        Action::WalletReady(
                            s.save_generated_wallet(wallet).await.map_err(Failure::from),
                        )
                    });
                }
            }
            Action::ImportWallet => {
                let phrase = self.wallet_setup_component.phrase_input.clone();
                self.spawn(move |s| async move {
                    Action::WalletReady(s.import_wallet(&phrase).await.map_err(Failure::from))
                });
            }
            Action::WalletReady(result) => match result {
                Ok(wallet) => {
                    self.wallet_setup_component.reset();
                    self.notify(
                        NotificationKind::Success,
                        format!("Wallet {} is ready", format_address(&wallet.address)),
                    );
                    self.navigate(Route::Dashboard)?;
                }
                Err(failure) => {
                    if !self.report_failure(&failure)? {
                        self.wallet_setup_component.is_loading = false;
                        self.wallet_setup_component.error_message = Some(failure.message);
                    }
                }
            },

            // Dashboard
            Action::RefreshBalance => {
                self.dashboard_component.is_loading = true;
                self.spawn(|s| async move {
                    Action::BalanceLoaded(s.refresh_balance().await.map_err(Failure::from))
                });
                self.spawn(|s| async move { Action::PriceLoaded(s.eth_price().await) });
            }
            Action::BalanceLoaded(result) => match result {
                Ok(balance) => {
                    if balance.stale {
                        self.notify(
                            NotificationKind::Info,
                            "Could not reach the server, showing cached balance",
                        );
                    }
                    self.dashboard_component.set_balance(balance);
                    let wallet = self.session.wallet()?;
                    self.send_component.set_wallet(wallet);
                }
                Err(failure) => {
                    self.dashboard_component.is_loading = false;
                    self.report_failure(&failure)?;
                }
            },
            Action::PriceLoaded(price) => {
                self.set_eth_price(price);
            }

            // Send
            Action::ReviewSend => {
                let send = &self.send_component;
                match self.session.review_send(
                    &send.recipient,
                    &send.amount,
                    send.currency,
                    self.eth_price,
                ) {
                    Ok(draft) => {
                        self.spawn(move |s| async move {
                            let quote = s.initiate_send(&draft).await;
                            Action::QuoteReady(
                                quote.map(|q| (draft, q)).map_err(Failure::from),
                            )
                        });
                    }
                    Err(e) => {
                        self.send_component.is_loading = false;
                        self.send_component.error_message = Some(e.user_message());
                    }
                }
            }
            Action::QuoteReady(result) => match result {
                Ok((draft, quote)) => {
                    if self.active_tab == Tab::Send && self.screen == Screen::Main {
                        self.send_component.open_review(draft, quote);
                    } else {
                        self.send_component.is_loading = false;
                    }
                }
                Err(failure) => {
                    if !self.report_failure(&failure)? {
                        self.send_component.is_loading = false;
                        self.send_component.error_message = Some(failure.message);
                    }
                }
            },
            Action::ConfirmSend => match self.send_component.review.clone() {
                Some(pending) => {
                    self.status_message = "Signing transfer...".to_string();
                    self.spawn(move |s| async move {
                        Action::SendCompleted(
                            s.sign_and_send(&pending.draft, &pending.quote)
                                .await
                                .map_err(Failure::from),
                        )
                    });
                }
                None => self.send_component.is_sending = false,
            },
            Action::CancelSend => {
                self.notify(NotificationKind::Info, "Transfer cancelled");
            }
            Action::SendCompleted(result) => {
                self.status_message = "Ready".to_string();
                match result {
                    Ok(tx) => {
                        self.send_component.clear();
                        let message = format!(
                            "Sent {} ETH to {}",
                            tx.amount,
                            format_address(&tx.address)
                        );
                        self.send_component.success_message = Some(message.clone());
                        self.notify(NotificationKind::Success, message);
                        self.sync_session()?;
                        self.dashboard_component
                            .set_recent(self.session.recent_transactions(RECENT_LIMIT)?);
                        self.history_component
                            .set_transactions(self.session.transactions()?);
                    }
                    Err(failure) => {
                        self.send_component.review = None;
                        self.send_component.is_sending = false;
                        if !self.report_failure(&failure)? {
                            self.send_component.error_message = Some(failure.message);
                        }
                    }
                }
            }

            // History
            Action::LoadTransactionDetails(index) => {
                match self.history_component.transactions.get(index).cloned() {
                    Some(tx) => self.spawn(move |s| async move {
                        Action::TransactionDetailsLoaded(
                            s.transaction_details(&tx).await.map_err(Failure::from),
                        )
                    }),
                    None => self.history_component.set_details(None),
                }
            }
            Action::TransactionDetailsLoaded(result) => match result {
                Ok(detail) => self.history_component.set_details(Some(detail)),
                Err(failure) => {
                    self.history_component.set_details(None);
                    self.report_failure(&failure)?;
                }
            },

            // Wallets
            Action::LoadWallets => {
                self.wallets_component.is_loading = true;
                self.spawn(|s| async move {
                    Action::WalletsLoaded(s.list_wallets().await.map_err(Failure::from))
                });
                self.spawn(|s| async move { Action::PriceLoaded(s.eth_price().await) });
            }
            Action::WalletsLoaded(result) => match result {
                Ok(wallets) => self.wallets_component.set_wallets(wallets),
                Err(failure) => {
                    self.wallets_component.is_loading = false;
                    self.report_failure(&failure)?;
                }
            },
            Action::CreateRemoteWallet => {
                let name = self.wallets_component.name_input.clone();
                self.spawn(move |s| async move {
                    Action::RemoteWalletAdded(
                        s.create_remote_wallet(&name).await.map_err(Failure::from),
                    )
                });
            }
            Action::ImportRemoteWallet => {
                let name = self.wallets_component.name_input.clone();
                let phrase = self.wallets_component.phrase_input.clone();
                self.spawn(move |s| async move {
                    Action::RemoteWalletAdded(
                        s.import_remote_wallet(&name, &phrase)
                            .await
                            .map_err(Failure::from),
                    )
                });
            }
            Action::RemoteWalletAdded(result) => match result {
                Ok(address) => {
                    self.wallets_component.close_form();
                    self.notify(
                        NotificationKind::Success,
                        format!("Wallet {} added", format_address(&address)),
                    );
                    self.action_tx.send(Action::LoadWallets)?;
                }
                Err(failure) => {
                    if !self.report_failure(&failure)? {
                        self.wallets_component.is_loading = false;
                        self.wallets_component.error_message = Some(failure.message);
                    }
                }
            },
            Action::SelectWallet(index) => {
                if let Some(remote) = self.wallets_component.wallets.get(index).cloned() {
                    match self.session.select_wallet(&remote) {
                        Ok(wallet) => {
                            self.sync_session()?;
                            if wallet.can_sign() {
                                self.notify(
                                    NotificationKind::Success,
                                    format!("Switched to {}", wallet.label()),
                                );
                            } else {
                                self.notify(
                                    NotificationKind::Info,
                                    format!("Switched to {} (watch-only)", wallet.label()),
                                );
                            }
                        }
                        Err(e) => self.notify(NotificationKind::Error, e.user_message()),
                    }
                }
            }

            // Profile
            Action::LoadProfile => {
                self.profile_component.is_loading = true;
                self.spawn(|s| async move {
                    Action::ProfileLoaded(s.fetch_profile().await.map_err(Failure::from))
                });
            }
            Action::ProfileLoaded(result) => match result {
                Ok(view) => {
                    self.user_label = Some(view.user.display_name());
                    self.profile_component.set_user(view.user, view.synced);
                }
                Err(failure) => {
                    self.profile_component.is_loading = false;
                    self.report_failure(&failure)?;
                }
            },
            Action::SaveProfile => {
                let first = self.profile_component.first_name.clone();
                let last = self.profile_component.last_name.clone();
                let phone = self.profile_component.phone_number.clone();
                self.spawn(move |s| async move {
                    Action::ProfileSaved(
                        s.update_profile(&first, &last, &phone)
                            .await
                            .map_err(Failure::from),
                    )
                });
            }
            Action::ProfileSaved(result) => match result {
                Ok(user) => {
                    self.user_label = Some(user.display_name());
                    self.profile_component.set_user(user, true);
                    self.profile_component.stop_editing();
                    self.profile_component.success_message = Some("Profile updated".to_string());
                    self.notify(NotificationKind::Success, "Profile updated");
                }
                Err(failure) => {
                    if !self.report_failure(&failure)? {
                        self.profile_component.is_loading = false;
                        self.profile_component.error_message = Some(failure.message);
                    }
                }
            },
        }
        Ok(())
    }

    fn header_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled(
                "Demo Wallet",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", self.config.api.backend),
                Style::default().fg(Color::Yellow),
            ),
        ];
        if let Some(name) = &self.user_label {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(name.clone(), Style::default().fg(Color::White)));
        }
        if self.screen == Screen::Main {
            if let Some(wallet) = &self.dashboard_component.wallet {
                spans.push(Span::raw("  |  "));
                spans.push(Span::styled(
                    format!("{} {}", wallet.label(), format_address(&wallet.address)),
                    Style::default().fg(Color::Green),
                ));
            }
        }
        Line::from(spans)
    }

    fn status_line(&self) -> Line<'static> {
        let (message, color) = match &self.notification {
            Some(n) => (n.message.clone(), n.kind.color()),
            None => (self.status_message.clone(), Color::Green),
        };
        let hints = match self.screen {
            Screen::Main if self.captures_input() => "[Esc]Back [Ctrl+C]Quit",
            Screen::Main => "[Tab]Switch [q]Quit",
            _ => "[Ctrl+C]Quit",
        };
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            Span::styled(message, Style::default().fg(color)),
            Span::raw("  |  "),
            Span::styled(hints, Style::default().fg(Color::DarkGray)),
        ])
    }

    fn draw_ui(&mut self) -> Result<()> {
        let screen = self.screen;
        let active_tab = self.active_tab;
        let header = self.header_line();
        let status = self.status_line();

        let Self {
            tui,
            login_component,
            signup_component,
            wallet_setup_component,
            dashboard_component,
            send_component,
            receive_component,
            history_component,
            wallets_component,
            profile_component,
            ..
        } = self;

        tui.draw(|f| {
            let main = screen == Screen::Main;
            let chunks = Layout::vertical([
                Constraint::Length(3),                            // Header
                Constraint::Length(if main { 3 } else { 0 }),     // Tabs
                Constraint::Min(0),                               // Content
                Constraint::Length(3),                            // Status
            ])
            .split(f.area());

            let bordered = || {
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
            };

            f.render_widget(Paragraph::new(header).block(bordered()), chunks[0]);

            if main {
                let titles: Vec<Line> = Tab::ALL.iter().map(|t| t.title()).collect();
                let tabs = Tabs::new(titles)
                    .block(Block::default().borders(Borders::ALL))
                    .select(active_tab.index())
                    .style(Style::default().fg(Color::White))
                    .highlight_style(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    );
                f.render_widget(tabs, chunks[1]);
            }

            let content = chunks[2];
            match screen {
                Screen::Login => login_component.draw(f, content),
                Screen::Signup => signup_component.draw(f, content),
                Screen::WalletSetup => wallet_setup_component.draw(f, content),
                Screen::Main => match active_tab {
                    Tab::Dashboard => dashboard_component.draw(f, content),
                    Tab::Send => send_component.draw(f, content),
                    Tab::Receive => receive_component.draw(f, content),
                    Tab::History => history_component.draw(f, content),
                    Tab::Wallets => wallets_component.draw(f, content),
                    Tab::Profile => profile_component.draw(f, content),
                },
            }

            f.render_widget(Paragraph::new(status).block(bordered()), chunks[3]);
        })?;
        Ok(())
    }
}
