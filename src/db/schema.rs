//! Database schema and migrations.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded; `schema_version` records which ones have run.

/// Database migrations, applied in order.
pub const MIGRATIONS: &[&str] = &[
    // v1: Competitors and the sources we watch for them
    r#"
CREATE TABLE competitors (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT,
    website     TEXT,
    logo_url    TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE monitored_urls (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    competitor_id        INTEGER NOT NULL REFERENCES competitors(id) ON DELETE CASCADE,
    url                  TEXT NOT NULL,
    name                 TEXT,
    page_type            TEXT NOT NULL DEFAULT 'other',  -- product, pricing, news, blog, press, careers, other
    check_interval_hours INTEGER NOT NULL DEFAULT 24,
    last_checked_at      TEXT,
    last_content_hash    TEXT,
    last_content         TEXT,
    is_active            INTEGER NOT NULL DEFAULT 1,
    last_error           TEXT,
    consecutive_errors   INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at           TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_monitored_urls_competitor ON monitored_urls(competitor_id);

CREATE TABLE page_snapshots (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    monitored_url_id INTEGER NOT NULL REFERENCES monitored_urls(id) ON DELETE CASCADE,
    content_hash     TEXT NOT NULL,
    content          TEXT,
    extracted_text   TEXT,
    has_changes      INTEGER NOT NULL DEFAULT 0,
    diff_summary     TEXT,
    diff_content     TEXT,
    captured_at      TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_page_snapshots_url ON page_snapshots(monitored_url_id);
CREATE INDEX idx_page_snapshots_captured ON page_snapshots(captured_at);

CREATE TABLE news_items (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    competitor_id INTEGER REFERENCES competitors(id) ON DELETE CASCADE,
    title         TEXT NOT NULL,
    description   TEXT,
    content       TEXT,
    url           TEXT NOT NULL UNIQUE,
    source        TEXT,
    author        TEXT,
    published_at  TEXT,
    collected_at  TEXT NOT NULL DEFAULT (datetime('now')),
    is_processed  INTEGER NOT NULL DEFAULT 0,
    is_relevant   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_news_items_competitor ON news_items(competitor_id);
CREATE INDEX idx_news_items_collected ON news_items(collected_at);
CREATE INDEX idx_news_items_processed ON news_items(is_processed);
"#,
    // v2: Alerts produced by analysis
    r#"
CREATE TABLE alerts (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    competitor_id         INTEGER NOT NULL REFERENCES competitors(id) ON DELETE CASCADE,
    source_type           TEXT NOT NULL,                  -- page_change, news, manual
    source_id             INTEGER,
    source_url            TEXT,
    title                 TEXT NOT NULL,
    summary               TEXT,
    raw_content           TEXT,
    diff_content          TEXT,
    signal_type           TEXT NOT NULL DEFAULT 'other',
    risk_level            TEXT NOT NULL DEFAULT 'medium',
    risk_score            INTEGER,
    confidence_score      INTEGER,
    analysis              TEXT,                           -- JSON
    relevance_explanation TEXT,
    assumptions           TEXT,
    recommended_actions   TEXT NOT NULL DEFAULT '[]',     -- JSON array
    playbook_used         TEXT,
    status                TEXT NOT NULL DEFAULT 'new',
    assigned_to           TEXT,
    resolution_notes      TEXT,
    detected_at           TEXT NOT NULL DEFAULT (datetime('now')),
    acknowledged_at       TEXT,
    resolved_at           TEXT,
    notification_sent     INTEGER NOT NULL DEFAULT 0,
    notification_channels TEXT
);

CREATE INDEX idx_alerts_competitor ON alerts(competitor_id);
CREATE INDEX idx_alerts_detected ON alerts(detected_at);
CREATE INDEX idx_alerts_status ON alerts(status);
CREATE INDEX idx_alerts_source ON alerts(source_type, source_id);
"#,
    // v3: Insights, battle cards and win/loss records
    r#"
CREATE TABLE insights (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    alert_id              INTEGER REFERENCES alerts(id) ON DELETE SET NULL,
    news_item_id          INTEGER REFERENCES news_items(id) ON DELETE SET NULL,
    competitor_id         INTEGER REFERENCES competitors(id) ON DELETE CASCADE,
    title                 TEXT NOT NULL,
    executive_summary     TEXT,
    competitor_product    TEXT,
    our_product           TEXT,
    comparison_summary    TEXT,
    competitor_advantages TEXT NOT NULL DEFAULT '[]',
    our_advantages        TEXT NOT NULL DEFAULT '[]',
    pricing_comparison    TEXT,
    feature_comparison    TEXT NOT NULL DEFAULT '{}',
    sales_insights        TEXT NOT NULL DEFAULT '{}',
    marketing_insights    TEXT NOT NULL DEFAULT '{}',
    product_insights      TEXT NOT NULL DEFAULT '{}',
    engineering_insights  TEXT NOT NULL DEFAULT '{}',
    executive_insights    TEXT NOT NULL DEFAULT '{}',
    immediate_actions     TEXT NOT NULL DEFAULT '[]',
    short_term_actions    TEXT NOT NULL DEFAULT '[]',
    long_term_actions     TEXT NOT NULL DEFAULT '[]',
    impact_score          INTEGER NOT NULL DEFAULT 50,
    urgency_score         INTEGER NOT NULL DEFAULT 50,
    confidence_score      INTEGER NOT NULL DEFAULT 50,
    is_reviewed           INTEGER NOT NULL DEFAULT 0,
    reviewed_by           TEXT,
    reviewed_at           TEXT,
    notes                 TEXT,
    created_at            TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at            TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_insights_alert ON insights(alert_id);
CREATE INDEX idx_insights_news ON insights(news_item_id);
CREATE INDEX idx_insights_competitor ON insights(competitor_id);

CREATE TABLE battle_cards (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    competitor_id         INTEGER NOT NULL REFERENCES competitors(id) ON DELETE CASCADE,
    name                  TEXT NOT NULL,
    version               TEXT NOT NULL DEFAULT '1.0',
    status                TEXT NOT NULL DEFAULT 'draft',  -- draft, active, archived
    elevator_pitch        TEXT,
    target_segment        TEXT,
    our_strengths         TEXT NOT NULL DEFAULT '[]',
    our_weaknesses        TEXT NOT NULL DEFAULT '[]',
    competitor_strengths  TEXT NOT NULL DEFAULT '[]',
    competitor_weaknesses TEXT NOT NULL DEFAULT '[]',
    key_differentiators   TEXT NOT NULL DEFAULT '[]',
    trap_questions        TEXT NOT NULL DEFAULT '[]',
    landmine_questions    TEXT NOT NULL DEFAULT '[]',
    common_objections     TEXT NOT NULL DEFAULT '[]',
    customer_wins         TEXT NOT NULL DEFAULT '[]',
    pricing_comparison    TEXT NOT NULL DEFAULT '{}',
    feature_comparison    TEXT NOT NULL DEFAULT '{}',
    created_by            TEXT,
    created_at            TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at            TEXT NOT NULL DEFAULT (datetime('now')),
    last_reviewed_at      TEXT
);

CREATE INDEX idx_battle_cards_competitor ON battle_cards(competitor_id);

CREATE TABLE win_loss_records (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    competitor_id          INTEGER NOT NULL REFERENCES competitors(id) ON DELETE CASCADE,
    deal_name              TEXT,
    deal_value             REAL,
    deal_currency          TEXT NOT NULL DEFAULT 'USD',
    outcome                TEXT NOT NULL,                -- won, lost, no_decision
    outcome_date           TEXT NOT NULL DEFAULT (datetime('now')),
    customer_name          TEXT,
    customer_industry      TEXT,
    customer_size          TEXT,
    customer_region        TEXT,
    primary_loss_reason    TEXT,
    loss_reasons           TEXT NOT NULL DEFAULT '[]',
    win_reasons            TEXT NOT NULL DEFAULT '[]',
    decision_makers        TEXT NOT NULL DEFAULT '[]',
    competitor_positioning TEXT,
    key_learnings          TEXT,
    sales_rep              TEXT,
    created_at             TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_win_loss_competitor ON win_loss_records(competitor_id);
CREATE INDEX idx_win_loss_outcome_date ON win_loss_records(outcome_date);
"#,
    // v4: Response playbooks and the feature comparison matrix
    r#"
CREATE TABLE competitive_playbooks (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    name                 TEXT NOT NULL,
    slug                 TEXT NOT NULL UNIQUE,
    description          TEXT,
    trigger_signal_types TEXT NOT NULL DEFAULT '[]',
    trigger_keywords     TEXT NOT NULL DEFAULT '[]',
    sales_actions        TEXT NOT NULL DEFAULT '[]',
    marketing_actions    TEXT NOT NULL DEFAULT '[]',
    product_actions      TEXT NOT NULL DEFAULT '[]',
    executive_actions    TEXT NOT NULL DEFAULT '[]',
    email_templates      TEXT NOT NULL DEFAULT '[]',
    talk_tracks          TEXT NOT NULL DEFAULT '[]',
    escalation_criteria  TEXT,
    escalation_contacts  TEXT NOT NULL DEFAULT '[]',
    is_active            INTEGER NOT NULL DEFAULT 1,
    priority             INTEGER NOT NULL DEFAULT 5,      -- 1-10
    created_at           TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at           TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE feature_comparisons (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    category                TEXT NOT NULL,
    feature_name            TEXT NOT NULL,
    description             TEXT,
    our_capability          TEXT NOT NULL DEFAULT 'none', -- full, partial, planned, none
    our_details             TEXT,
    competitor_capabilities TEXT NOT NULL DEFAULT '{}',   -- competitor id -> {capability, details}
    customer_importance     INTEGER NOT NULL DEFAULT 5,   -- 1-10
    differentiation_level   TEXT,                         -- unique, better, parity, weaker
    last_verified           TEXT,
    verified_by             TEXT,
    created_at              TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at              TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_feature_comparisons_category ON feature_comparisons(category);
"#,
];
