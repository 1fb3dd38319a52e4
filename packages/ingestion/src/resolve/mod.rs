//! Company entity resolution.
//!
//! Lookup by slug OR case-insensitive exact name before ever creating a
//! new company, so the same employer arriving from a new source with a
//! slightly different slug still resolves to the known record.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::traits::store::CompanyStore;
use crate::types::company::{slugify, Company};

/// Ceiling on slug-suffix retries before giving up with a terminal error.
pub const MAX_SLUG_ATTEMPTS: u32 = 50;

/// Find the company for an employer name, creating it on first sighting.
///
/// Slug collisions on create are resolved by appending an incrementing
/// numeric suffix, bounded at [`MAX_SLUG_ATTEMPTS`]. Creation races are
/// caught by the store's unique constraint: on conflict the name lookup
/// is retried before the next suffix, so a concurrent writer's record
/// wins over a suffixed duplicate.
pub async fn resolve_company<S: CompanyStore>(
    store: &S,
    name: &str,
    website: Option<&str>,
) -> Result<Company> {
    let base_slug = slugify(name);

    if let Some(existing) = store.find_company_by_slug(&base_slug).await? {
        return Ok(existing);
    }
    if let Some(existing) = store.find_company_by_name(name).await? {
        return Ok(existing);
    }

    let mut company = Company::new(name);
    if let Some(website) = website {
        company.website = Some(website.to_string());
    }

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        match store.insert_company(&company).await {
            Ok(created) => {
                info!(slug = %created.slug, name = %created.name, "company created");
                return Ok(created);
            }
            Err(IngestError::Conflict { .. }) => {
                // Lost a race to a concurrent writer for the same employer?
                if let Some(existing) = store.find_company_by_name(name).await? {
                    return Ok(existing);
                }
                company.slug = format!("{}-{}", base_slug, attempt + 1);
                debug!(slug = %company.slug, "slug taken, retrying with suffix");
            }
            Err(e) => return Err(e),
        }
    }

    Err(IngestError::Conflict {
        entity: "company",
        key: base_slug,
        attempts: MAX_SLUG_ATTEMPTS,
    })
}

/// Queue best-effort website/logo enrichment for a company.
///
/// Runs detached; never blocks or fails job creation. The website guess
/// is a HEAD probe of the obvious domain, the logo is the site favicon.
pub fn spawn_enrichment<S>(store: Arc<S>, company: Company)
where
    S: CompanyStore + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = enrich_company(store.as_ref(), company).await {
            warn!(error = %e, "company enrichment failed");
        }
    });
}

async fn enrich_company<S: CompanyStore>(store: &S, mut company: Company) -> Result<()> {
    if company.website.is_some() && company.logo_url.is_some() {
        return Ok(());
    }

    if company.website.is_none() {
        let candidate = format!("https://{}.com", company.slug.replace('-', ""));
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| IngestError::Config(e.to_string()))?;

        match client.head(&candidate).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(slug = %company.slug, website = %candidate, "website probe succeeded");
                company.website = Some(candidate);
            }
            Ok(response) => {
                debug!(slug = %company.slug, status = %response.status(), "website probe rejected");
            }
            Err(e) => {
                debug!(slug = %company.slug, error = %e, "website probe failed");
            }
        }
    }

    if company.logo_url.is_none() {
        if let Some(website) = &company.website {
            company.logo_url = Some(format!("{}/favicon.ico", website.trim_end_matches('/')));
        }
    }

    company.updated_at = chrono::Utc::now();
    store.update_company(&company).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::RwLock;

    #[tokio::test]
    async fn test_first_sighting_creates() {
        let store = MemoryStore::new();
        let company = resolve_company(&store, "Initech", None).await.unwrap();
        assert_eq!(company.slug, "initech");
    }

    #[tokio::test]
    async fn test_same_name_resolves_to_existing() {
        let store = MemoryStore::new();
        let first = resolve_company(&store, "Initech", None).await.unwrap();
        let second = resolve_company(&store, "INITECH", None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.companies().len(), 1);
    }

    #[tokio::test]
    async fn test_variant_slug_same_name_resolves_to_existing() {
        let store = MemoryStore::new();
        // Known employer under a manually assigned slug.
        let mut seeded = Company::new("Acme");
        seeded.slug = "acme-corporation".into();
        store.insert_company(&seeded).await.unwrap();

        // A new source presents the same name with a different derived
        // slug; the name match prevents a duplicate.
        let resolved = resolve_company(&store, "acme", None).await.unwrap();
        assert_eq!(resolved.id, seeded.id);
        assert_eq!(store.companies().len(), 1);
    }

    #[tokio::test]
    async fn test_website_passed_through_on_create() {
        let store = MemoryStore::new();
        let company = resolve_company(&store, "Globex", Some("https://globex.test"))
            .await
            .unwrap();
        assert_eq!(company.website.as_deref(), Some("https://globex.test"));
    }

    /// Simulates losing creation races: lookups never see the competing
    /// writer, inserts conflict on every taken slug.
    #[derive(Default)]
    struct RacyStore {
        taken: RwLock<HashSet<String>>,
        created: RwLock<Vec<Company>>,
    }

    #[async_trait]
    impl CompanyStore for RacyStore {
        async fn find_company_by_slug(&self, _slug: &str) -> Result<Option<Company>> {
            Ok(None)
        }

        async fn find_company_by_name(&self, _name: &str) -> Result<Option<Company>> {
            Ok(None)
        }

        async fn insert_company(&self, company: &Company) -> Result<Company> {
            let mut taken = self.taken.write().unwrap();
            if taken.contains(&company.slug) {
                return Err(IngestError::Conflict {
                    entity: "company",
                    key: company.slug.clone(),
                    attempts: 1,
                });
            }
            taken.insert(company.slug.clone());
            self.created.write().unwrap().push(company.clone());
            Ok(company.clone())
        }

        async fn update_company(&self, company: &Company) -> Result<Company> {
            Ok(company.clone())
        }
    }

    #[tokio::test]
    async fn test_race_resolved_with_suffix() {
        let store = RacyStore::default();
        store.taken.write().unwrap().insert("acme".into());
        store.taken.write().unwrap().insert("acme-2".into());

        let company = resolve_company(&store, "Acme", None).await.unwrap();
        assert_eq!(company.slug, "acme-3");
    }

    #[tokio::test]
    async fn test_retry_loop_is_bounded() {
        let store = RacyStore::default();
        {
            let mut taken = store.taken.write().unwrap();
            taken.insert("acme".into());
            for i in 2..=(MAX_SLUG_ATTEMPTS + 2) {
                taken.insert(format!("acme-{i}"));
            }
        }

        let err = resolve_company(&store, "Acme", None).await;
        assert!(matches!(
            err,
            Err(IngestError::Conflict {
                attempts: MAX_SLUG_ATTEMPTS,
                ..
            })
        ));
    }
}
