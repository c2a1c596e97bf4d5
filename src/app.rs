use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::domain::{ImageUuid, NormalizedName};
use crate::error::MarkerError;
use crate::marker;
use crate::phylopic::{IndexItem, PhylopicClient, vector_url_at};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub species: String,
    pub normalized: NormalizedName,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    pub fn markers_created(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.marker_path.is_some())
            .count()
    }

    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.error.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub title: String,
    pub href: String,
    pub uuid: Option<ImageUuid>,
    pub silhouette_path: Option<String>,
    pub marker_path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: EventLevel,
    pub message: String,
}

impl ProgressEvent {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Error,
            message: message.into(),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: PhylopicClient> {
    store: Store,
    client: C,
    image_base_url: String,
}

impl<C: PhylopicClient> App<C> {
    pub fn new(store: Store, client: C, image_base_url: impl Into<String>) -> Self {
        Self {
            store,
            client,
            image_base_url: image_base_url.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches every silhouette PhyloPic lists for `species` and composes a
    /// marker from each. Setup and index failures abort the run; a failing
    /// result is reported and the next one is processed.
    pub fn make_marker(
        &self,
        species: &str,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, MarkerError> {
        self.store.ensure_root()?;

        let normalized = NormalizedName::new(species);
        sink.event(ProgressEvent::info(format!("Original species name: {species}")));
        sink.event(ProgressEvent::info(format!("Normalized species name: {normalized}")));
        sink.event(ProgressEvent::info(format!(
            "Fetching data from PhyloPic API for species: {normalized}"
        )));

        let results = self.client.search_images(&normalized)?;
        info!(species = %normalized, results = results.len(), "index query finished");
        if results.is_empty() {
            sink.event(ProgressEvent::info("No results found for this species"));
        }

        let mut items = Vec::with_capacity(results.len());
        for result in results {
            items.push(self.process_item(&normalized, result, sink));
        }

        Ok(RunReport {
            species: species.to_string(),
            normalized,
            items,
        })
    }

    fn process_item(
        &self,
        species: &NormalizedName,
        item: IndexItem,
        sink: &dyn ProgressSink,
    ) -> ItemReport {
        let uuid = ImageUuid::from_href(&item.href);
        let mut report = ItemReport {
            title: item.title,
            href: item.href,
            uuid: uuid.clone(),
            silhouette_path: None,
            marker_path: None,
            error: None,
        };

        let Some(uuid) = uuid else {
            let err = MarkerError::MissingImageId(report.href.clone());
            warn!(href = %report.href, "skipping result without image UUID");
            sink.event(ProgressEvent::error(format!("Error resolving image: {err}")));
            report.error = Some(err.to_string());
            return report;
        };

        let url = vector_url_at(&self.image_base_url, &uuid);
        sink.event(ProgressEvent::info(format!(
            "Title: {}\nImage URL: {}\nUUID: {uuid}\nVector SVG: {url}",
            report.title, report.href
        )));

        let silhouette_path = match self.download_silhouette(&url, species, &uuid) {
            Ok(path) => path,
            Err(err) => {
                warn!(%url, error = %err, "silhouette download failed");
                sink.event(ProgressEvent::error(format!("Error downloading SVG: {err}")));
                report.error = Some(err.to_string());
                return report;
            }
        };
        sink.event(ProgressEvent::info(format!("Downloaded SVG to: {silhouette_path}")));
        report.silhouette_path = Some(silhouette_path.to_string());

        let marker_path = self.store.marker_path(species);
        match marker::compose(&silhouette_path, &marker_path) {
            Ok(()) => {
                sink.event(ProgressEvent::info(format!("Created combined SVG: {marker_path}")));
                report.marker_path = Some(marker_path.to_string());
            }
            Err(err) => {
                warn!(path = %silhouette_path, error = %err, "marker composition failed");
                sink.event(ProgressEvent::error(format!("Error creating marker: {err}")));
                report.error = Some(err.to_string());
            }
        }
        report
    }

    /// Downloads the vector image at `url` and stores it as
    /// `{species}_{uuid}.svg` in the output directory.
    pub fn download_silhouette(
        &self,
        url: &str,
        species: &NormalizedName,
        uuid: &ImageUuid,
    ) -> Result<Utf8PathBuf, MarkerError> {
        let body = self.client.download_vector(url)?;
        self.store.ensure_root()?;
        let path = self.store.silhouette_path(species, uuid);
        Store::write_bytes_atomic(&path, &body)?;
        info!(%path, bytes = body.len(), "wrote silhouette");
        Ok(path)
    }
}
