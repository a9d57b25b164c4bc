//! Relational schema: `teams`, `competitions`, `competition_teams`,
//! `balances`, `trades`, `prices`, `portfolio_snapshots`,
//! `portfolio_token_values`. UUID primary keys; monetary amounts stored as
//! decimal-string TEXT columns (never REAL) to avoid lossy float storage.

use rusqlite::Connection;

pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            contact_person TEXT NOT NULL,
            wallet_address TEXT,
            api_key TEXT UNIQUE NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            deactivation_reason TEXT,
            deactivation_date TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS competitions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            start_date TEXT,
            end_date TEXT,
            cross_chain_trading_enabled INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS competition_teams (
            competition_id TEXT NOT NULL REFERENCES competitions(id),
            team_id TEXT NOT NULL REFERENCES teams(id),
            joined_at TEXT NOT NULL,
            PRIMARY KEY (competition_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS balances (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL REFERENCES teams(id),
            token TEXT NOT NULL,
            chain TEXT NOT NULL,
            specific_chain TEXT NOT NULL,
            amount TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (team_id, token, specific_chain)
        );

        CREATE TABLE IF NOT EXISTS trades (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL REFERENCES teams(id),
            competition_id TEXT NOT NULL REFERENCES competitions(id),
            from_token TEXT NOT NULL,
            to_token TEXT NOT NULL,
            from_chain TEXT NOT NULL,
            to_chain TEXT NOT NULL,
            from_specific_chain TEXT,
            to_specific_chain TEXT,
            from_amount TEXT NOT NULL,
            to_amount TEXT,
            price TEXT,
            success INTEGER NOT NULL,
            error TEXT,
            reason TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS prices (
            token TEXT NOT NULL,
            specific_chain TEXT NOT NULL,
            price_usd TEXT NOT NULL,
            fetched_at TEXT NOT NULL,
            provider TEXT NOT NULL,
            PRIMARY KEY (token, specific_chain)
        );

        CREATE TABLE IF NOT EXISTS portfolio_snapshots (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL REFERENCES teams(id),
            competition_id TEXT NOT NULL REFERENCES competitions(id),
            total_value_usd TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS portfolio_token_values (
            id TEXT PRIMARY KEY,
            snapshot_id TEXT NOT NULL REFERENCES portfolio_snapshots(id),
            token_address TEXT NOT NULL,
            specific_chain TEXT NOT NULL,
            amount TEXT NOT NULL,
            price_usd TEXT NOT NULL,
            value_usd TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_trades_team ON trades(team_id);
        CREATE INDEX IF NOT EXISTS idx_trades_competition ON trades(competition_id);
        CREATE INDEX IF NOT EXISTS idx_snapshots_competition ON portfolio_snapshots(competition_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_balances_team ON balances(team_id);
        ",
    )
}
