use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Configuration;
use crate::error::AttemptError;
use crate::events::{ArtworkRecord, FetchOutcome, FetchRequest};

/// Subset of the collection object body this crate cares about. Missing
/// fields decode as empty strings; emptiness is handled at render time.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectRecord {
    pub primary_image_small: String,
    pub primary_image: String,
    pub title: String,
    pub artist_display_name: String,
    pub object_date: String,
    pub credit_line: String,
}

impl ObjectRecord {
    /// Resolve the image URL and flatten into an [`ArtworkRecord`].
    /// `None` when the record has no image at all.
    fn into_artwork(self, primary_preferred: bool) -> Option<ArtworkRecord> {
        let image_url = preferred_image_url(
            &self.primary_image_small,
            &self.primary_image,
            primary_preferred,
        )?;
        Some(ArtworkRecord {
            image_url,
            title: self.title,
            artist: self.artist_display_name,
            date: self.object_date,
            credit_line: self.credit_line,
        })
    }
}

/// Full image when preferred and present; otherwise the small variant,
/// falling back to the full one.
fn preferred_image_url(small: &str, full: &str, primary_preferred: bool) -> Option<String> {
    if primary_preferred && !full.is_empty() {
        return Some(full.to_string());
    }
    if !small.is_empty() {
        Some(small.to_string())
    } else if !full.is_empty() {
        Some(full.to_string())
    } else {
        None
    }
}

fn random_object_id(rng: &mut StdRng, max_object_id: u64) -> u64 {
    rng.random_range(1..=max_object_id)
}

async fn fetch_once(
    client: &reqwest::Client,
    base_url: &str,
    id: u64,
    primary_preferred: bool,
) -> Result<ArtworkRecord, AttemptError> {
    let response = client.get(format!("{base_url}/{id}")).send().await?;
    if !response.status().is_success() {
        return Err(AttemptError::Status(response.status()));
    }
    let record: ObjectRecord = response.json().await?;
    record
        .into_artwork(primary_preferred)
        .ok_or(AttemptError::NoImage)
}

/// Bounded retry loop over random object ids.
///
/// Each failed attempt (bad status, missing image, network or decode error)
/// consumes one unit of the budget and the loop moves on to a fresh id. The
/// first usable record wins; exactly one record is ever produced per call.
pub async fn fetch_with_retry(
    client: &reqwest::Client,
    cfg: &Configuration,
    rng: &mut StdRng,
) -> FetchOutcome {
    let mut attempts = 0u32;
    while attempts < cfg.max_retry {
        let id = random_object_id(rng, cfg.max_object_id);
        match fetch_once(client, &cfg.api_base_url, id, cfg.primary_image_preferred).await {
            Ok(record) => {
                debug!(object_id = id, attempts, "artwork fetched");
                return FetchOutcome::Fetched(record);
            }
            Err(err) => {
                attempts += 1;
                debug!(object_id = id, attempt = attempts, %err, "attempt discarded");
            }
        }
    }
    FetchOutcome::Exhausted { attempts }
}

pub fn build_client(cfg: &Configuration) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = cfg.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("building http client")
}

/// Services prefetch requests from the gallery, one at a time. Requests
/// queue in the channel while a retry loop is in flight.
pub async fn run(
    cfg: Configuration,
    mut request_rx: Receiver<FetchRequest>,
    outcome_tx: Sender<FetchOutcome>,
    cancel: CancellationToken,
) -> Result<()> {
    let client = build_client(&cfg)?;
    let mut rng = StdRng::from_os_rng();

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_req = request_rx.recv() => {
                if maybe_req.is_none() {
                    break;
                }
                let outcome = select! {
                    _ = cancel.cancelled() => break,
                    outcome = fetch_with_retry(&client, &cfg, &mut rng) => outcome,
                };
                if let FetchOutcome::Exhausted { attempts } = &outcome {
                    warn!(attempts, "retry budget exhausted without a usable record");
                }
                if outcome_tx.send(outcome).await.is_err() {
                    warn!("gallery channel closed");
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(small: &str, full: &str) -> ObjectRecord {
        ObjectRecord {
            primary_image_small: small.to_string(),
            primary_image: full.to_string(),
            ..ObjectRecord::default()
        }
    }

    #[test]
    fn small_image_wins_by_default() {
        assert_eq!(
            preferred_image_url("small.jpg", "full.jpg", false).as_deref(),
            Some("small.jpg")
        );
    }

    #[test]
    fn falls_back_to_full_image_when_small_missing() {
        assert_eq!(
            preferred_image_url("", "full.jpg", false).as_deref(),
            Some("full.jpg")
        );
    }

    #[test]
    fn preferred_flag_picks_full_image_even_when_small_present() {
        assert_eq!(
            preferred_image_url("small.jpg", "full.jpg", true).as_deref(),
            Some("full.jpg")
        );
    }

    #[test]
    fn preferred_flag_still_uses_small_when_full_missing() {
        assert_eq!(
            preferred_image_url("small.jpg", "", true).as_deref(),
            Some("small.jpg")
        );
    }

    #[test]
    fn no_image_at_all_resolves_to_none() {
        assert_eq!(preferred_image_url("", "", false), None);
        assert_eq!(preferred_image_url("", "", true), None);
    }

    #[test]
    fn object_record_flattens_into_artwork() {
        let mut rec = record("s.jpg", "f.jpg");
        rec.title = "Irises".to_string();
        rec.artist_display_name = "Vincent van Gogh".to_string();
        rec.object_date = "1890".to_string();
        rec.credit_line = "Gift of Adele R. Levy".to_string();

        let art = rec.into_artwork(false).unwrap();
        assert_eq!(art.image_url, "s.jpg");
        assert_eq!(art.title, "Irises");
        assert_eq!(art.artist, "Vincent van Gogh");
        assert_eq!(art.date, "1890");
        assert_eq!(art.credit_line, "Gift of Adele R. Levy");
    }

    #[test]
    fn imageless_record_is_rejected() {
        assert!(record("", "").into_artwork(false).is_none());
    }

    #[test]
    fn parses_api_body_field_names() {
        let body = serde_json::json!({
            "objectID": 436_535,
            "primaryImage": "https://images.example/full.jpg",
            "primaryImageSmall": "https://images.example/small.jpg",
            "title": "Wheat Field with Cypresses",
            "artistDisplayName": "Vincent van Gogh",
            "objectDate": "1889",
            "creditLine": "Purchase, The Annenberg Foundation Gift, 1993",
            "department": "European Paintings"
        });
        let rec: ObjectRecord = serde_json::from_value(body).unwrap();
        assert_eq!(rec.primary_image_small, "https://images.example/small.jpg");
        assert_eq!(rec.primary_image, "https://images.example/full.jpg");
        assert_eq!(rec.artist_display_name, "Vincent van Gogh");
        assert_eq!(rec.object_date, "1889");
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let rec: ObjectRecord = serde_json::from_str("{}").unwrap();
        assert!(rec.primary_image_small.is_empty());
        assert!(rec.primary_image.is_empty());
        assert!(rec.title.is_empty());
    }

    #[test]
    fn random_ids_stay_in_catalog_range() {
        let mut rng = StdRng::seed_from_u64(0xA57);
        for _ in 0..1000 {
            let id = random_object_id(&mut rng, 471_581);
            assert!((1..=471_581).contains(&id));
        }
        assert_eq!(random_object_id(&mut rng, 1), 1);
    }
}
