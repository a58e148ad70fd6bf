//! In-memory sanctions list source

use super::ScreeningSource;
use crate::context::ScreeningContext;
use crate::similarity::{normalize_name, NameSimilarity};
use crate::types::{
    DataQuality, EntityType, RawMatch, RiskLevel, SourceKind, SourceMeta, SourceResult,
};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One designated party on a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Identifier within the list
    pub id: String,
    /// Primary name
    pub name: String,
    /// Alternative names
    pub aliases: Vec<String>,
    /// Kind of party
    pub entity_type: EntityType,
    /// Associated country
    pub country: String,
    /// Nationality
    pub nationality: Option<String>,
    /// Date of birth, as published
    pub date_of_birth: Option<String>,
    /// Place of birth
    pub place_of_birth: Option<String>,
    /// Passport number
    pub passport_number: Option<String>,
    /// National identification number
    pub national_id: Option<String>,
    /// Address
    pub address: Option<String>,
    /// Title or position
    pub title: Option<String>,
    /// Remarks
    pub remarks: Option<String>,
    /// Sanctions program
    pub program: String,
    /// Severity assigned by the list maintainer
    pub risk_level: RiskLevel,
    /// Last amendment of the listing
    pub updated_at: DateTime<Utc>,
}

impl ListEntry {
    fn to_raw_match(&self, kind: SourceKind, score: f64) -> RawMatch {
        RawMatch {
            entity_id: self.id.clone(),
            entity_name: self.name.clone(),
            entity_type: self.entity_type,
            country: self.country.clone(),
            nationality: self.nationality.clone(),
            date_of_birth: self.date_of_birth.clone(),
            place_of_birth: self.place_of_birth.clone(),
            passport_number: self.passport_number.clone(),
            national_id: self.national_id.clone(),
            address: self.address.clone(),
            title: self.title.clone(),
            remarks: self.remarks.clone(),
            program: self.program.clone(),
            program_list: kind.list_name().to_string(),
            match_score: score,
            risk_level: self.risk_level,
            last_updated: self.updated_at,
            source_id: kind.label().to_string(),
        }
    }
}

// CSV layout: aliases are a single `;`-separated column.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    aliases: Option<String>,
    entity_type: EntityType,
    country: String,
    nationality: Option<String>,
    date_of_birth: Option<String>,
    place_of_birth: Option<String>,
    passport_number: Option<String>,
    national_id: Option<String>,
    address: Option<String>,
    title: Option<String>,
    remarks: Option<String>,
    program: String,
    risk_level: RiskLevel,
    updated_at: DateTime<Utc>,
}

impl From<CsvRow> for ListEntry {
    fn from(row: CsvRow) -> Self {
        let aliases = row
            .aliases
            .map(|a| {
                a.split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        ListEntry {
            id: row.id,
            name: row.name,
            aliases,
            entity_type: row.entity_type,
            country: row.country,
            nationality: row.nationality,
            date_of_birth: row.date_of_birth,
            place_of_birth: row.place_of_birth,
            passport_number: row.passport_number,
            national_id: row.national_id,
            address: row.address,
            title: row.title,
            remarks: row.remarks,
            program: row.program,
            risk_level: row.risk_level,
            updated_at: row.updated_at,
        }
    }
}

type Entries = DashMap<String, ListEntry>;

/// Sanctions list held in memory and scored with a similarity measure
pub struct ListSource {
    kind: SourceKind,
    // Published list, entry_id -> entry. Reloads swap the whole map.
    entries: RwLock<Arc<Entries>>,
    similarity: Arc<dyn NameSimilarity>,
    match_threshold: f64,
    latency: Duration,
}

impl std::fmt::Debug for ListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSource")
            .field("kind", &self.kind)
            .field("entries", &self.len())
            .field("match_threshold", &self.match_threshold)
            .finish_non_exhaustive()
    }
}

impl ListSource {
    /// Empty list source
    pub fn new(
        kind: SourceKind,
        similarity: Arc<dyn NameSimilarity>,
        match_threshold: f64,
    ) -> Self {
        Self {
            kind,
            entries: RwLock::new(Arc::new(DashMap::new())),
            similarity,
            match_threshold,
            latency: Duration::ZERO,
        }
    }

    /// Add a fixed delay to every search, e.g. to mimic a remote provider
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Builder form of [`ListSource::load`]
    pub fn with_entries(self, entries: Vec<ListEntry>) -> Self {
        self.load(entries);
        self
    }

    /// Replace the list contents, returns the new entry count
    ///
    /// The new list is built aside and published in one step; a search
    /// running meanwhile sees either the old or the new list in full.
    pub fn load(&self, entries: Vec<ListEntry>) -> usize {
        let map = DashMap::new();
        for entry in entries {
            map.insert(entry.id.clone(), entry);
        }

        let count = map.len();
        *self.entries.write() = Arc::new(map);

        info!("Loaded {} sanctions list with {} entries", self.kind, count);
        count
    }

    fn snapshot(&self) -> Arc<Entries> {
        Arc::clone(&self.entries.read())
    }

    /// Parse list entries from CSV
    pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ListEntry>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        csv_reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(ListEntry::from).map_err(Error::from))
            .collect()
    }

    /// Replace the list contents from a CSV file
    pub fn load_csv_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        let file = std::fs::File::open(path)?;
        let entries = Self::read_csv(file)?;
        Ok(self.load(entries))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn best_score(&self, query: &str, entry: &ListEntry) -> f64 {
        std::iter::once(&entry.name)
            .chain(entry.aliases.iter())
            .map(|name| self.similarity.similarity(query, &normalize_name(name)))
            .fold(0.0, f64::max)
    }

    fn scan(&self, entries: &Entries, entity_name: &str) -> Vec<RawMatch> {
        let query = normalize_name(entity_name);
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<RawMatch> = entries
            .iter()
            .filter_map(|entry_ref| {
                let entry = entry_ref.value();
                let score = self.best_score(&query, entry);
                if score >= self.match_threshold {
                    debug!(
                        "{} match: {} ~ {} ({:.3})",
                        self.kind, entity_name, entry.name, score
                    );
                    Some(entry.to_raw_match(self.kind, score))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        matches
    }

    /// Quality by freshness of the most recently amended entry
    fn data_quality(entries: &Entries) -> DataQuality {
        let newest = entries.iter().map(|e| e.value().updated_at).max();
        match newest {
            None => DataQuality::Unknown,
            Some(updated) => {
                let age = Utc::now() - updated;
                if age <= ChronoDuration::days(7) {
                    DataQuality::Excellent
                } else if age <= ChronoDuration::days(30) {
                    DataQuality::Good
                } else {
                    DataQuality::Average
                }
            }
        }
    }
}

#[async_trait]
impl ScreeningSource for ListSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(
        &self,
        entity_name: &str,
        _country: &str,
        ctx: &ScreeningContext,
    ) -> Result<SourceResult> {
        let started = Instant::now();

        if !self.latency.is_zero() {
            ctx.run(async {
                tokio::time::sleep(self.latency).await;
                Ok(())
            })
            .await?;
        } else if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let entries = self.snapshot();
        let matches = self.scan(&entries, entity_name);

        Ok(SourceResult {
            matches,
            meta: SourceMeta {
                source: self.kind,
                elapsed_ms: started.elapsed().as_millis() as u64,
                data_quality: Self::data_quality(&entries),
                entries_checked: entries.len(),
            },
        })
    }

    async fn health_check(&self, ctx: &ScreeningContext) -> Result<()> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.is_empty() {
            return Err(Error::source_failed(
                self.kind.label(),
                "sanctions list not loaded",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::JaroWinkler;

    fn entry(id: &str, name: &str, aliases: &[&str]) -> ListEntry {
        ListEntry {
            id: id.to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            entity_type: EntityType::Entity,
            country: "IR".to_string(),
            nationality: None,
            date_of_birth: None,
            place_of_birth: None,
            passport_number: None,
            national_id: None,
            address: None,
            title: None,
            remarks: None,
            program: "IRAN".to_string(),
            risk_level: RiskLevel::Critical,
            updated_at: Utc::now(),
        }
    }

    fn ofac() -> ListSource {
        ListSource::new(SourceKind::Ofac, Arc::new(JaroWinkler), 0.85).with_entries(vec![
            entry("OFAC-001", "Bank Melli Iran", &["Melli Bank", "BMI"]),
            entry("OFAC-002", "Banco Bandes", &["BANDES"]),
            entry("OFAC-003", "Commercial Bank of Syria", &["CBS"]),
        ])
    }

    #[tokio::test]
    async fn test_exact_match() {
        let result = ofac()
            .search("Bank Melli Iran", "IR", &ScreeningContext::new())
            .await
            .unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].entity_id, "OFAC-001");
        assert_eq!(result.matches[0].match_score, 1.0);
        assert_eq!(result.matches[0].source_id, "OFAC");
        assert_eq!(result.meta.entries_checked, 3);
        assert_eq!(result.meta.data_quality, DataQuality::Excellent);
    }

    #[tokio::test]
    async fn test_fuzzy_match() {
        // Typo: Meli instead of Melli
        let result = ofac()
            .search("Bank Meli Iran", "IR", &ScreeningContext::new())
            .await
            .unwrap();
        assert_eq!(result.matches.len(), 1);
        assert!(result.matches[0].match_score > 0.9);
    }

    #[tokio::test]
    async fn test_alias_match() {
        let result = ofac().search("melli bank", "", &ScreeningContext::new()).await.unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].entity_name, "Bank Melli Iran");
    }

    #[tokio::test]
    async fn test_clean_entity() {
        let result = ofac().search("HDFC Bank", "IN", &ScreeningContext::new()).await.unwrap();
        assert!(result.matches.is_empty());
        let result = ofac().search("   ", "IN", &ScreeningContext::new()).await.unwrap();
        assert!(result.matches.is_empty());
    }

    #[tokio::test]
    async fn test_latency_honours_cancellation() {
        let source = ofac().with_latency(Duration::from_secs(5));
        let ctx = ScreeningContext::new();
        ctx.cancel();
        let result = source.search("Bank Melli Iran", "IR", &ctx).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_health_check_requires_entries() {
        let ctx = ScreeningContext::new();
        assert!(ofac().health_check(&ctx).await.is_ok());

        let empty = ListSource::new(SourceKind::Eu, Arc::new(JaroWinkler), 0.85);
        assert!(matches!(
            empty.health_check(&ctx).await,
            Err(Error::Source { .. })
        ));
    }

    #[test]
    fn test_read_csv() {
        let data = "\
id,name,aliases,entity_type,country,nationality,date_of_birth,place_of_birth,passport_number,national_id,address,title,remarks,program,risk_level,updated_at
EU-17,VTB Bank,VTB; Vneshtorgbank,entity,RU,,,,,,Moscow,,,RUSSIA,high,2024-03-01T00:00:00Z
EU-18,Ivan Petrov,,individual,RU,RU,1970-01-01,Moscow,P123,,,Director,,RUSSIA,medium,2024-03-01T00:00:00Z
";
        let entries = ListSource::read_csv(data.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].aliases,
            vec!["VTB".to_string(), "Vneshtorgbank".to_string()]
        );
        assert_eq!(entries[0].address.as_deref(), Some("Moscow"));
        assert!(entries[0].nationality.is_none());
        assert!(entries[1].aliases.is_empty());
        assert_eq!(entries[1].entity_type, EntityType::Individual);
        assert_eq!(entries[1].passport_number.as_deref(), Some("P123"));
        assert_eq!(entries[1].risk_level, RiskLevel::Medium);

        let source = ListSource::new(SourceKind::Eu, Arc::new(JaroWinkler), 0.85);
        assert_eq!(source.load(entries), 2);
        assert_eq!(
            ListSource::data_quality(&source.snapshot()),
            DataQuality::Average
        );
    }

    #[tokio::test]
    async fn test_search_during_reload_sees_full_list() {
        let listing = || {
            let mut entries: Vec<ListEntry> = (0..5_000)
                .map(|i| entry(&format!("OFAC-F{i}"), &format!("Filler Trading {i}"), &[]))
                .collect();
            entries.push(entry("OFAC-001", "Bank Melli Iran", &["Melli Bank"]));
            entries
        };

        let source = Arc::new(
            ListSource::new(SourceKind::Ofac, Arc::new(JaroWinkler), 0.85)
                .with_entries(listing()),
        );

        let reloader = {
            let source = Arc::clone(&source);
            std::thread::spawn(move || {
                for _ in 0..20 {
                    source.load(listing());
                }
            })
        };

        let ctx = ScreeningContext::new();
        let mut searches = 0;
        while !reloader.is_finished() || searches == 0 {
            let result = source.search("Bank Melli Iran", "IR", &ctx).await.unwrap();
            assert_eq!(result.matches.len(), 1);
            assert_eq!(result.meta.entries_checked, 5_001);
            assert_eq!(result.meta.data_quality, DataQuality::Excellent);
            assert!(source.health_check(&ctx).await.is_ok());
            searches += 1;
        }

        reloader.join().unwrap();
        assert_eq!(source.len(), 5_001);
    }
}
