// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Re-analysis as the user types
//!
//! An [`AnalysisSession`] analyzes one document at a time. Submitting a new
//! model cancels the pass still running for the previous one, so a stale
//! result is never delivered after a newer one was asked for.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use querymodel_catalog::{Catalog, CatalogSnapshot};

use crate::analyzer::{AnalysisOutcome, SemanticAnalyzer};
use crate::builder::QueryModel;
use crate::config::AnalysisConfig;
use crate::context::DataContext;
use crate::error::{SemanticError, SemanticResult};

pub struct AnalysisSession {
    analyzer: Arc<SemanticAnalyzer>,
    catalog: Arc<dyn Catalog>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            analyzer: Arc::new(SemanticAnalyzer::new(config)),
            catalog,
            in_flight: Mutex::new(None),
        }
    }

    pub fn analyzer(&self) -> &SemanticAnalyzer {
        &self.analyzer
    }

    /// Analyze a model, superseding any analysis still in flight
    ///
    /// The propagation pass runs on the blocking pool. The model is handed
    /// back together with the outcome, since the pass classifies its symbols.
    ///
    /// # Errors
    ///
    /// [`SemanticError::Cancelled`] if a newer submission (or
    /// [`cancel`](Self::cancel)) superseded this one.
    #[instrument(skip_all)]
    pub async fn submit(&self, model: QueryModel) -> SemanticResult<(QueryModel, AnalysisOutcome)> {
        let token = CancellationToken::new();
        {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(previous) = in_flight.replace(token.clone()) {
                debug!("Superseding in-flight analysis");
                previous.cancel();
            }
        }

        let snapshot = CatalogSnapshot::prefetch(self.catalog.as_ref(), model.referenced_tables()).await;
        if token.is_cancelled() {
            return Err(SemanticError::Cancelled);
        }

        let analyzer = Arc::clone(&self.analyzer);
        let mut model = model;
        tokio::task::spawn_blocking(move || -> SemanticResult<(QueryModel, AnalysisOutcome)> {
            let outcome = analyzer.propagate(&mut model, &snapshot, &DataContext::empty(), Some(&token))?;
            Ok((model, outcome))
        })
        .await
        .map_err(|e| SemanticError::Internal(e.to_string()))?
    }

    /// Cancel the analysis in flight, if any
    pub async fn cancel(&self) {
        if let Some(token) = self.in_flight.lock().await.take() {
            token.cancel();
        }
    }
}
