use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use campus_core::{
    CampusLexicon, CampusParser, Decision, Institution, RawPlace, ReconcileError, Reconciler,
};
use place_search::{HarvestEnd, PageFetcher, PlaceSearchClient, RetryPolicy};
use roster::{RosterRow, SupplementaryIndex};
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{config::EnrichConfig, telemetry::EnrichmentTelemetry};

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Institutions searched.
    pub institutions: usize,
    /// Roster rows skipped as duplicate names.
    pub duplicates: usize,
    /// Places returned by the search.
    pub places_seen: usize,
    /// Campuses attached.
    pub accepted: usize,
    /// Attachments that moved a place between institutions.
    pub reassigned: usize,
    /// Places whose title did not parse.
    pub rejected: usize,
    /// Places naming the institution itself.
    pub no_campus: usize,
    /// Places without id or title.
    pub malformed: usize,
    /// Places kept by a more specific owner.
    pub owned_elsewhere: usize,
    /// Places losing to a longer title for the same campus name.
    pub slot_taken: usize,
    /// Institutions whose pagination was cut short.
    pub abandoned: usize,
}

/// Everything a run produced, including after a quota abort.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Institutions in roster order, with their campuses.
    pub institutions: Vec<Institution>,
    /// Places rejected by the parser, in encounter order.
    pub rejected: Vec<RawPlace>,
    /// Roster rows with no supplementary record.
    pub without_details: Vec<RosterRow>,
    /// Counters.
    pub stats: RunStats,
    /// Set when the provider reported the quota as used up.
    pub quota_exhausted: Option<String>,
    /// Invariant violations found after the run; empty when consistent.
    pub audit: Vec<String>,
}

impl RunOutcome {
    /// Whether the run stopped on quota exhaustion.
    #[must_use]
    pub const fn is_quota_exhausted(&self) -> bool {
        self.quota_exhausted.is_some()
    }
}

/// Runs institutions one after another through search, parsing and
/// reconciliation.
pub struct EnrichmentRuntime {
    parser: CampusParser,
    fetcher: PageFetcher,
    supplementary: SupplementaryIndex,
    telemetry: Option<EnrichmentTelemetry>,
}

impl EnrichmentRuntime {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> EnrichmentRuntimeBuilder {
        EnrichmentRuntimeBuilder::default()
    }

    /// Processes `rows` in order. Each institution is fully paginated
    /// before the next starts. Quota exhaustion stops the loop and returns
    /// what was reconciled so far.
    ///
    /// # Errors
    ///
    /// Only internal reconciler inconsistencies; search failures are part
    /// of the outcome.
    pub async fn run(&self, rows: &[RosterRow]) -> Result<RunOutcome> {
        let mut reconciler = Reconciler::new();
        let mut outcome = RunOutcome::default();
        self.log(
            LogLevel::Info,
            "enrich.run.started",
            json!({ "institutions": rows.len(), "supplementary": self.supplementary.len() }),
        );
        for (index, row) in rows.iter().enumerate() {
            let mut institution = row.to_institution();
            let has_details = self.supplementary.merge(&mut institution);
            match reconciler.register(institution) {
                Ok(()) => {}
                Err(ReconcileError::DuplicateInstitution(name)) => {
                    outcome.stats.duplicates += 1;
                    self.log(
                        LogLevel::Warn,
                        "enrich.institution.duplicate",
                        json!({ "name": name, "id": row.id }),
                    );
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
            if !has_details {
                outcome.without_details.push(row.clone());
            }
            outcome.stats.institutions += 1;
            self.log(
                LogLevel::Info,
                "enrich.institution.started",
                json!({ "index": index + 1, "total": rows.len(), "name": row.name }),
            );

            let harvest = self.fetcher.harvest(&row.name).await;
            for place in &harvest.places {
                self.process_place(&mut reconciler, place, &row.name, &mut outcome)?;
            }
            match harvest.end {
                HarvestEnd::Complete => {}
                HarvestEnd::Abandoned {
                    page_index,
                    attempts,
                    error,
                } => {
                    outcome.stats.abandoned += 1;
                    self.log(
                        LogLevel::Warn,
                        "enrich.page.abandoned",
                        json!({
                            "name": row.name,
                            "page": page_index,
                            "attempts": attempts,
                            "error": error.to_string(),
                        }),
                    );
                }
                HarvestEnd::QuotaExhausted(message) => {
                    self.log(
                        LogLevel::Error,
                        "enrich.quota.exhausted",
                        json!({ "name": row.name, "message": message }),
                    );
                    outcome.quota_exhausted = Some(message);
                    break;
                }
            }
        }

        outcome.audit = reconciler.audit();
        if !outcome.audit.is_empty() {
            self.log(
                LogLevel::Error,
                "enrich.audit.failed",
                json!({ "problems": outcome.audit }),
            );
        }
        outcome.institutions = reconciler.into_institutions();
        self.log(
            LogLevel::Info,
            "enrich.run.finished",
            json!({
                "stats": outcome.stats,
                "quota_exhausted": outcome.is_quota_exhausted(),
            }),
        );
        Ok(outcome)
    }

    fn process_place(
        &self,
        reconciler: &mut Reconciler,
        place: &RawPlace,
        institution: &str,
        outcome: &mut RunOutcome,
    ) -> Result<()> {
        outcome.stats.places_seen += 1;
        let parsed = self.parser.parse(place, institution);
        let decision = reconciler.try_assign(place, institution, parsed)?;
        let title = place.title.as_deref().unwrap_or_default();
        let place_id = place.place_id().unwrap_or_default();
        match decision {
            Decision::Malformed => outcome.stats.malformed += 1,
            Decision::NoCampus => outcome.stats.no_campus += 1,
            Decision::Rejected => {
                outcome.stats.rejected += 1;
                outcome.rejected.push(place.clone());
                self.log(
                    LogLevel::Debug,
                    "enrich.place.rejected",
                    json!({ "institution": institution, "title": title, "id": place_id }),
                );
            }
            Decision::OwnedElsewhere {
                owner,
                owner_ratio,
                ratio,
            } => {
                outcome.stats.owned_elsewhere += 1;
                self.log(
                    LogLevel::Debug,
                    "enrich.place.owned_elsewhere",
                    json!({
                        "institution": institution,
                        "title": title,
                        "owner": owner,
                        "owner_ratio": owner_ratio.as_f64(),
                        "ratio": ratio.as_f64(),
                    }),
                );
            }
            Decision::SlotTaken {
                campus,
                holder,
                holder_title,
            } => {
                outcome.stats.slot_taken += 1;
                self.log(
                    LogLevel::Debug,
                    "enrich.place.slot_taken",
                    json!({
                        "institution": institution,
                        "title": title,
                        "campus": campus,
                        "holder": holder,
                        "holder_title": holder_title,
                    }),
                );
            }
            Decision::Accepted {
                campus,
                ratio,
                reassigned_from,
                displaced,
            } => {
                outcome.stats.accepted += 1;
                if let Some(previous) = reassigned_from {
                    outcome.stats.reassigned += 1;
                    self.log(
                        LogLevel::Info,
                        "enrich.place.reassigned",
                        json!({
                            "title": title,
                            "from": previous.institution,
                            "from_ratio": previous.ratio.as_f64(),
                            "to": institution,
                            "ratio": ratio.as_f64(),
                        }),
                    );
                }
                self.log(
                    LogLevel::Info,
                    "enrich.place.accepted",
                    json!({
                        "institution": institution,
                        "title": title,
                        "campus": campus,
                        "id": place_id,
                        "displaced": displaced,
                    }),
                );
            }
        }
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            if let Err(err) = telemetry.log(level, message, metadata) {
                eprintln!("enrichment telemetry write failed: {err:?}");
            }
        }
    }
}

/// Builder for [`EnrichmentRuntime`].
pub struct EnrichmentRuntimeBuilder {
    client: Option<Arc<dyn PlaceSearchClient>>,
    lexicon: CampusLexicon,
    retry: RetryPolicy,
    pause: Duration,
    page_size: u32,
    supplementary: SupplementaryIndex,
    telemetry: Option<EnrichmentTelemetry>,
}

impl Default for EnrichmentRuntimeBuilder {
    fn default() -> Self {
        Self {
            client: None,
            lexicon: CampusLexicon::default(),
            retry: RetryPolicy::default(),
            pause: Duration::ZERO,
            page_size: 20,
            supplementary: SupplementaryIndex::default(),
            telemetry: None,
        }
    }
}

impl EnrichmentRuntimeBuilder {
    /// Applies lexicon, retry budget, pause and page size from `config`.
    #[must_use]
    pub fn config(mut self, config: &EnrichConfig) -> Self {
        self.lexicon = config.parser.lexicon();
        self.retry = RetryPolicy::from_settings(&config.retry);
        self.pause = Duration::from_millis(config.retry.pause_ms);
        self.page_size = config.search.page_size;
        self
    }

    /// Sets the search client.
    #[must_use]
    pub fn client(mut self, client: Arc<dyn PlaceSearchClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the parser lexicon.
    #[must_use]
    pub fn lexicon(mut self, lexicon: CampusLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the pause after every page call.
    #[must_use]
    pub const fn pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the supplementary index.
    #[must_use]
    pub fn supplementary(mut self, supplementary: SupplementaryIndex) -> Self {
        self.supplementary = supplementary;
        self
    }

    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: EnrichmentTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the runtime.
    ///
    /// # Errors
    ///
    /// No search client was set.
    pub fn build(self) -> Result<EnrichmentRuntime> {
        let Some(client) = self.client else {
            bail!("enrichment runtime requires a place-search client");
        };
        let mut fetcher = PageFetcher::new(client)
            .retry(self.retry)
            .pause(self.pause)
            .page_size(self.page_size);
        if let Some(telemetry) = self.telemetry.clone() {
            fetcher = fetcher.on_retry(move |notice| {
                let _ = telemetry.log(
                    LogLevel::Warn,
                    "enrich.page.retry",
                    json!({
                        "name": notice.keyword,
                        "page": notice.page_index,
                        "attempt": notice.attempt,
                        "delay_ms": u64::try_from(notice.delay.as_millis()).unwrap_or(u64::MAX),
                        "error": notice.error.to_string(),
                    }),
                );
            });
        }
        Ok(EnrichmentRuntime {
            parser: CampusParser::new(self.lexicon),
            fetcher,
            supplementary: self.supplementary,
            telemetry: self.telemetry,
        })
    }
}
