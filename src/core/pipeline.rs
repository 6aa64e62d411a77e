use crate::config::{ConnectorConfig, OutputMode};
use crate::core::entry_builder::{build_dataset, build_schemas};
use crate::core::top_entry_builder;
use crate::core::writer::JsonlWriter;
use crate::domain::model::{ObjectKind, TOP_ENTRY_HIERARCHY};
use crate::domain::ports::{SourceConnector, Uploader};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// What happens with the finished file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadDecision {
    Upload {
        bucket: String,
        folder: Option<String>,
    },
    LocalOnly,
    BelowThreshold {
        min_expected_entries: usize,
    },
}

/// Local-only runs never upload and never report the threshold; bucket runs
/// upload unless the enabled threshold is not met.
pub fn decide_upload(
    output: &OutputMode,
    min_expected_entries: Option<usize>,
    entries_count: usize,
) -> UploadDecision {
    match output {
        OutputMode::LocalOnly => UploadDecision::LocalOnly,
        OutputMode::Bucket { bucket, folder } => match min_expected_entries {
            Some(min) if entries_count < min => UploadDecision::BelowThreshold {
                min_expected_entries: min,
            },
            _ => UploadDecision::Upload {
                bucket: bucket.clone(),
                folder: folder.clone(),
            },
        },
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    /// Table and view entries; catalog and schema lines are not counted.
    pub entries_count: usize,
    pub lines_written: usize,
    pub uploaded_to: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Walks catalogs → schemas → tables/views and writes the import file.
pub struct MetadataPipeline<C: SourceConnector, U: Uploader> {
    config: ConnectorConfig,
    connector: C,
    uploader: U,
    monitor: SystemMonitor,
}

impl<C: SourceConnector, U: Uploader> MetadataPipeline<C, U> {
    pub fn new(config: ConnectorConfig, connector: C, uploader: U) -> Self {
        Self::new_with_monitoring(config, connector, uploader, false)
    }

    pub fn new_with_monitoring(
        config: ConnectorConfig,
        connector: C,
        uploader: U,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            config,
            connector,
            uploader,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let file_name = self.config.output_file_name();

        if self.config.output.is_local_only() {
            tracing::info!(
                "File will be generated in local '{}' directory only",
                self.config.output_dir().display()
            );
        }

        let mut writer = JsonlWriter::create(self.config.output_dir(), &file_name)?;

        let walked = self.walk(&mut writer).await;
        if let Err(e) = self.connector.close().await {
            tracing::warn!("Failed to close source session: {}", e);
        }
        let entries_count = walked?;

        let lines_written = writer.lines_written();
        let output_path = writer.finish()?;
        tracing::info!("{} rows written to file {}", entries_count, file_name);

        let uploaded_to = match decide_upload(
            &self.config.output,
            self.config.min_expected_entries,
            entries_count,
        ) {
            UploadDecision::LocalOnly => {
                if let Some(min) = self.config.min_expected_entries {
                    tracing::debug!(
                        "Local output only; {} entries against min_expected_entries {}",
                        entries_count,
                        min
                    );
                }
                None
            }
            UploadDecision::BelowThreshold {
                min_expected_entries,
            } => {
                tracing::info!(
                    "Row count is less than min_expected_entries value of {}. Will not upload to Cloud Storage bucket.",
                    min_expected_entries
                );
                None
            }
            UploadDecision::Upload { bucket, folder } => {
                match folder.as_deref() {
                    Some(folder) => {
                        tracing::info!("Uploading to Cloud Storage bucket: {}/{}", bucket, folder)
                    }
                    None => tracing::info!("Uploading to Cloud Storage bucket: {}", bucket),
                }
                let location = self
                    .uploader
                    .upload(&output_path, &bucket, folder.as_deref())
                    .await?;
                tracing::info!("✅ Uploaded {}", location);
                Some(location)
            }
        };

        self.monitor.log_final_stats();
        tracing::info!("Finished");

        Ok(RunReport {
            output_path,
            entries_count,
            lines_written,
            uploaded_to,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Returns the number of table and view entries written.
    async fn walk(&self, writer: &mut JsonlWriter) -> Result<usize> {
        let mut entries_count = 0;

        let catalogs = self.connector.list_catalogs().await?;
        tracing::debug!("Found {} catalogs", catalogs.len());

        for catalog in &catalogs {
            // 先寫入不需要查詢的頂層 entry
            for entry_type in TOP_ENTRY_HIERARCHY {
                if let Some(item) = top_entry_builder::create(&self.config, *entry_type, catalog) {
                    writer.write_item(&item)?;
                }
            }

            let schemas = self.connector.list_schemas(catalog).await?;
            writer.write_items(&build_schemas(&self.config, catalog, &schemas))?;

            tracing::info!("Processing schemas in catalog {}..", catalog);

            for schema in &schemas {
                for kind in ObjectKind::ALL {
                    let rows = self.connector.fetch_columns(catalog, schema, kind).await?;
                    let items = build_dataset(&self.config, catalog, schema, kind, &rows);
                    tracing::info!("Processed {} {}S in {}", items.len(), kind, schema);
                    entries_count += writer.write_items(&items)?;
                }
            }

            self.monitor.log_stats(&format!("catalog {}", catalog));
        }

        Ok(entries_count)
    }
}
