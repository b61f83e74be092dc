//! Account-scoped data orchestrator.
//!
//! Owns the account selection and the four fetchable slots every view reads:
//! accounts, metrics, equity, trades. Sequences the dependent fetches
//! (accounts, then default selection, then the per-account reads), runs the
//! metrics and equity fetches concurrently, and keeps slot state consistent
//! with the selection: a response is tagged with the account id it was
//! requested for and dropped when the selection has moved on.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use futures::join;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::api::{
    AccountResponse, ApiGateway, EquityPointResponse, EquityQuery, KpiQuery, KpiSummaryResponse,
    TradeListQuery, TradeResponse,
};
use crate::error::{DashboardError, GatewayError};
use crate::models::{Account, EquityPoint, FetchState, MetricsSummary, TradeRecord};
use crate::session::Session;

/// Orchestrator state shared with the views.
pub struct Dashboard {
    gateway: Arc<ApiGateway>,
    session: Arc<Session>,

    selected_account: Arc<RwLock<Option<i64>>>,
    accounts: Arc<RwLock<FetchState<Vec<Account>>>>,
    metrics: Arc<RwLock<FetchState<MetricsSummary>>>,
    equity: Arc<RwLock<FetchState<Vec<EquityPoint>>>>,
    trades: Arc<RwLock<FetchState<Vec<TradeRecord>>>>,

    // Bumped on every slot or selection write so views can await changes.
    revision: watch::Sender<u64>,
}

impl Dashboard {
    pub fn new(gateway: Arc<ApiGateway>, session: Arc<Session>) -> Self {
        let (revision, _) = watch::channel(0);

        Self {
            gateway,
            session,
            selected_account: Arc::new(RwLock::new(None)),
            accounts: Arc::new(RwLock::new(FetchState::Idle)),
            metrics: Arc::new(RwLock::new(FetchState::Idle)),
            equity: Arc::new(RwLock::new(FetchState::Idle)),
            trades: Arc::new(RwLock::new(FetchState::Idle)),
            revision,
        }
    }

    /// Default reporting window: the trailing calendar month, computed at
    /// call time.
    pub fn default_window() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        let start = end.checked_sub_months(Months::new(1)).unwrap_or(end);
        (start, end)
    }

    // ==================== State accessors ====================

    pub async fn selected_account(&self) -> Option<i64> {
        *self.selected_account.read().await
    }

    pub async fn accounts(&self) -> FetchState<Vec<Account>> {
        self.accounts.read().await.clone()
    }

    pub async fn metrics(&self) -> FetchState<MetricsSummary> {
        self.metrics.read().await.clone()
    }

    pub async fn equity(&self) -> FetchState<Vec<EquityPoint>> {
        self.equity.read().await.clone()
    }

    pub async fn trades(&self) -> FetchState<Vec<TradeRecord>> {
        self.trades.read().await.clone()
    }

    /// Subscribe to slot changes. The value is a revision counter; read the
    /// slots for the actual state.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ==================== Operations ====================

    /// Fetch the account list. When no account is selected yet, the first
    /// account in server order becomes the selection. An empty list leaves
    /// the dependent slots untouched: nothing is fetched without a selected
    /// account.
    pub async fn load_accounts(&self) -> Result<(), DashboardError> {
        self.ensure_authenticated()?;
        self.set_accounts(FetchState::Loading).await;

        match self.gateway.get::<Vec<AccountResponse>>("/accounts").await {
            Ok(rows) => {
                let accounts: Vec<Account> = rows.into_iter().map(Account::from).collect();

                {
                    let mut selected = self.selected_account.write().await;
                    if selected.is_none() {
                        *selected = accounts.first().map(|a| a.id);
                    }
                }

                debug!(count = accounts.len(), "accounts loaded");
                self.set_accounts(FetchState::Ready(accounts)).await;
            }
            Err(e) => {
                self.handle_rejection(&e).await;
                self.set_accounts(FetchState::Failed(e.to_string())).await;
            }
        }

        Ok(())
    }

    /// Switch the selection to `id` (must be in the most recently loaded
    /// list), invalidate the per-account slots, and fetch fresh data for the
    /// new selection over the default window.
    pub async fn select_account(&self, id: i64) -> Result<(), DashboardError> {
        self.ensure_authenticated()?;

        let first_account = {
            let accounts = self.accounts.read().await;
            let FetchState::Ready(list) = &*accounts else {
                return Err(DashboardError::AccountsNotLoaded);
            };
            if !list.iter().any(|a| a.id == id) {
                return Err(DashboardError::UnknownAccount(id));
            }
            // The id was found, so the list has a first entry.
            list[0].id
        };

        *self.selected_account.write().await = Some(id);
        self.set_metrics(FetchState::Loading).await;
        self.set_equity(FetchState::Loading).await;
        self.set_trades(FetchState::Loading).await;

        let (start, end) = Self::default_window();
        let trade_query = TradeListQuery::default();
        join!(
            self.fetch_metrics(id, start, end),
            self.fetch_equity(id, start, end),
            self.fetch_trades(first_account, &trade_query),
        );

        Ok(())
    }

    /// Fetch the KPI summary and the daily equity series for the selected
    /// account over `[start, end]`, concurrently. The two slots resolve
    /// independently: one failing neither blocks nor rolls back the other.
    pub async fn refresh_metrics_and_equity(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), DashboardError> {
        self.ensure_authenticated()?;

        let account_id = self
            .selected_account()
            .await
            .ok_or(DashboardError::NoAccountSelected)?;

        self.set_metrics(FetchState::Loading).await;
        self.set_equity(FetchState::Loading).await;

        join!(
            self.fetch_metrics(account_id, start, end),
            self.fetch_equity(account_id, start, end),
        );

        Ok(())
    }

    /// Fetch the trade history. Deliberately scoped to the FIRST account in
    /// the loaded list rather than the selection; the journal's trade view
    /// only covers the primary account. Requires `load_accounts` to have
    /// completed; an empty account list leaves the slot idle.
    pub async fn load_trades(&self, query: &TradeListQuery) -> Result<(), DashboardError> {
        self.ensure_authenticated()?;

        let first_account = match &*self.accounts.read().await {
            FetchState::Ready(list) => list.first().map(|a| a.id),
            _ => return Err(DashboardError::AccountsNotLoaded),
        };
        let Some(account_id) = first_account else {
            return Ok(());
        };

        self.set_trades(FetchState::Loading).await;
        self.fetch_trades(account_id, query).await;

        Ok(())
    }

    // ==================== Fetch internals ====================

    async fn fetch_metrics(&self, account_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) {
        let query = KpiQuery {
            account_id,
            start,
            end,
            scope: "account",
        };

        let result = self
            .gateway
            .get_with_query::<KpiSummaryResponse, _>("/kpis/summary", &query)
            .await;

        self.store_metrics_result(account_id, result).await;
    }

    async fn store_metrics_result(
        &self,
        account_id: i64,
        result: Result<KpiSummaryResponse, GatewayError>,
    ) {
        if !self.is_current(account_id).await {
            debug!(account_id, "discarding stale metrics response");
            return;
        }

        match result {
            Ok(resp) => self.set_metrics(FetchState::Ready(resp.into())).await,
            Err(e) => {
                self.handle_rejection(&e).await;
                self.set_metrics(FetchState::Failed(e.to_string())).await;
            }
        }
    }

    async fn fetch_equity(&self, account_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) {
        let query = EquityQuery {
            account_id,
            start,
            end,
        };

        let result = self
            .gateway
            .get_with_query::<Vec<EquityPointResponse>, _>("/equity/daily", &query)
            .await;

        self.store_equity_result(account_id, result).await;
    }

    async fn store_equity_result(
        &self,
        account_id: i64,
        result: Result<Vec<EquityPointResponse>, GatewayError>,
    ) {
        if !self.is_current(account_id).await {
            debug!(account_id, "discarding stale equity response");
            return;
        }

        match result {
            Ok(rows) => {
                let points = rows.into_iter().map(EquityPoint::from).collect();
                self.set_equity(FetchState::Ready(points)).await;
            }
            Err(e) => {
                self.handle_rejection(&e).await;
                self.set_equity(FetchState::Failed(e.to_string())).await;
            }
        }
    }

    async fn fetch_trades(&self, account_id: i64, query: &TradeListQuery) {
        let path = format!("/accounts/{}/trades", account_id);
        let result = self
            .gateway
            .get_with_query::<Vec<TradeResponse>, _>(&path, query)
            .await
            .and_then(|rows| {
                rows.into_iter()
                    .map(TradeRecord::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(GatewayError::Decode)
            });

        match result {
            Ok(trades) => self.set_trades(FetchState::Ready(trades)).await,
            Err(e) => {
                self.handle_rejection(&e).await;
                self.set_trades(FetchState::Failed(e.to_string())).await;
            }
        }
    }

    // ==================== Helpers ====================

    fn ensure_authenticated(&self) -> Result<(), DashboardError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(DashboardError::NotAuthenticated)
        }
    }

    async fn is_current(&self, account_id: i64) -> bool {
        *self.selected_account.read().await == Some(account_id)
    }

    /// A rejected credential on any authenticated call expires the session.
    async fn handle_rejection(&self, error: &GatewayError) {
        if error.is_unauthorized() {
            self.session.expire().await;
        }
    }

    async fn set_accounts(&self, state: FetchState<Vec<Account>>) {
        *self.accounts.write().await = state;
        self.touch();
    }

    async fn set_metrics(&self, state: FetchState<MetricsSummary>) {
        *self.metrics.write().await = state;
        self.touch();
    }

    async fn set_equity(&self, state: FetchState<Vec<EquityPoint>>) {
        *self.equity.write().await = state;
        self.touch();
    }

    async fn set_trades(&self, state: FetchState<Vec<TradeRecord>>) {
        *self.trades.write().await = state;
        self.touch();
    }

    fn touch(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CredentialStore;
    use mockito::Matcher;

    const TWO_ACCOUNTS: &str = r#"[{"id":1,"account_code":"ACC1"},{"id":2,"account_code":"ACC2"}]"#;

    async fn authed_dashboard(server: &mockito::ServerGuard) -> (Arc<Session>, Dashboard) {
        let gateway = Arc::new(ApiGateway::new(server.url()).unwrap());
        let store = CredentialStore::new("sqlite::memory:").await.unwrap();
        store.write("t1").await.unwrap();
        let session = Arc::new(Session::initialize(store, gateway.clone()).await.unwrap());
        let dashboard = Dashboard::new(gateway, session.clone());
        (session, dashboard)
    }

    async fn mock_accounts(server: &mut mockito::ServerGuard, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/accounts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_kpis(
        server: &mut mockito::ServerGuard,
        account_id: i64,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("GET", "/kpis/summary")
            .match_query(Matcher::UrlEncoded(
                "account_id".into(),
                account_id.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_equity(
        server: &mut mockito::ServerGuard,
        account_id: i64,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("GET", "/equity/daily")
            .match_query(Matcher::UrlEncoded(
                "account_id".into(),
                account_id.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_trades(
        server: &mut mockito::ServerGuard,
        account_id: i64,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("GET", format!("/accounts/{}/trades", account_id).as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn kpi_body(total_trades: u32) -> String {
        format!(
            r#"{{"win_rate":0.6,"avg_win":120.0,"avg_loss":-80.0,"profit_factor":1.8,"expectancy":40.0,"mdd":0.12,"total_trades":{}}}"#,
            total_trades
        )
    }

    #[tokio::test]
    async fn test_load_accounts_defaults_to_first_in_server_order() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();

        assert_eq!(dashboard.selected_account().await, Some(1));
        let accounts = dashboard.accounts().await;
        assert_eq!(accounts.ready().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_empty_account_list_leaves_dependent_slots_idle() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, "[]").await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();
        dashboard.load_trades(&TradeListQuery::default()).await.unwrap();

        assert_eq!(dashboard.selected_account().await, None);
        assert!(dashboard.metrics().await.is_idle());
        assert!(dashboard.equity().await.is_idle());
        assert!(dashboard.trades().await.is_idle());
    }

    #[tokio::test]
    async fn test_metrics_failure_does_not_roll_back_equity() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;
        server
            .mock("GET", "/kpis/summary")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;
        mock_equity(
            &mut server,
            1,
            r#"[{"date":"2026-07-01","equity":10000.0,"net_pnl_day":0.0}]"#,
        )
        .await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();
        let (start, end) = Dashboard::default_window();
        dashboard.refresh_metrics_and_equity(start, end).await.unwrap();

        assert!(dashboard.metrics().await.is_failed());
        let equity = dashboard.equity().await;
        assert_eq!(equity.ready().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_rejected_credential_expires_session_and_blocks_fetches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/accounts")
            .with_status(401)
            .with_body(r#"{"detail":"Could not validate credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let (session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();

        assert!(!session.is_authenticated());
        assert!(dashboard.accounts().await.is_failed());

        // The next protected fetch never reaches the network.
        let err = dashboard.load_accounts().await.unwrap_err();
        assert!(matches!(err, DashboardError::NotAuthenticated));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_select_account_rejects_unknown_id() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();

        let err = dashboard.select_account(99).await.unwrap_err();
        assert!(matches!(err, DashboardError::UnknownAccount(99)));
    }

    #[tokio::test]
    async fn test_refresh_requires_selection() {
        let server = mockito::Server::new_async().await;
        let (_session, dashboard) = authed_dashboard(&server).await;

        let (start, end) = Dashboard::default_window();
        let err = dashboard
            .refresh_metrics_and_equity(start, end)
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NoAccountSelected));
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded() {
        let server = mockito::Server::new_async().await;
        let (_session, dashboard) = authed_dashboard(&server).await;

        // Selection moved to account 2 while a response for account 1 was
        // still in flight.
        *dashboard.selected_account.write().await = Some(2);
        dashboard.set_metrics(FetchState::Loading).await;

        let late: Result<KpiSummaryResponse, GatewayError> =
            Ok(serde_json::from_str(&kpi_body(11)).unwrap());
        dashboard.store_metrics_result(1, late).await;

        assert!(dashboard.metrics().await.is_loading());

        // A matching tag is applied normally.
        let current: Result<KpiSummaryResponse, GatewayError> =
            Ok(serde_json::from_str(&kpi_body(22)).unwrap());
        dashboard.store_metrics_result(2, current).await;

        let metrics = dashboard.metrics().await;
        assert_eq!(metrics.ready().map(|m| m.total_trades), Some(22));
    }

    #[tokio::test]
    async fn test_rapid_selection_keeps_last_selected_account_only() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;
        mock_kpis(&mut server, 1, &kpi_body(11)).await;
        mock_kpis(&mut server, 2, &kpi_body(22)).await;
        mock_equity(
            &mut server,
            1,
            r#"[{"date":"2026-07-01","equity":1000.0,"net_pnl_day":1.0}]"#,
        )
        .await;
        mock_equity(
            &mut server,
            2,
            r#"[{"date":"2026-07-01","equity":2000.0,"net_pnl_day":2.0},{"date":"2026-07-02","equity":2050.0,"net_pnl_day":50.0}]"#,
        )
        .await;
        mock_trades(&mut server, 1, "[]").await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();

        let (first, second) = tokio::join!(
            dashboard.select_account(1),
            dashboard.select_account(2),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(dashboard.selected_account().await, Some(2));
        let metrics = dashboard.metrics().await;
        assert_eq!(metrics.ready().map(|m| m.total_trades), Some(22));
        let equity = dashboard.equity().await;
        assert_eq!(equity.ready().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_trades_remain_scoped_to_first_account() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;
        mock_kpis(&mut server, 2, &kpi_body(22)).await;
        mock_equity(&mut server, 2, "[]").await;
        // Only account 1 serves trades; a fetch against account 2 would fail.
        mock_trades(
            &mut server,
            1,
            r#"[{"id":7,"symbol":"2330","side":"BUY","qty":1000.0,"price":600.5,"trade_ts":"2026-07-01T09:30:00"}]"#,
        )
        .await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        dashboard.load_accounts().await.unwrap();
        dashboard.select_account(2).await.unwrap();

        let trades = dashboard.trades().await;
        let trades = trades.ready().expect("trades should be ready");
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "2330");
    }

    #[tokio::test]
    async fn test_subscribers_observe_slot_writes() {
        let mut server = mockito::Server::new_async().await;
        mock_accounts(&mut server, TWO_ACCOUNTS).await;

        let (_session, dashboard) = authed_dashboard(&server).await;
        let mut observer = dashboard.subscribe();
        dashboard.load_accounts().await.unwrap();

        assert!(observer.has_changed().unwrap());
        // Loading then ready: at least two revisions.
        assert!(*observer.borrow_and_update() >= 2);
    }

    #[tokio::test]
    async fn test_load_trades_before_accounts_is_an_error() {
        let server = mockito::Server::new_async().await;
        let (_session, dashboard) = authed_dashboard(&server).await;

        let err = dashboard
            .load_trades(&TradeListQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::AccountsNotLoaded));
    }
}
