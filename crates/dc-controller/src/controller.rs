//! The controller owning one data source per origin.

use dc_core::{DataResponse, SourceParams, SourceType, StorageError};
use dc_source::DataSource;

use crate::error::ControllerError;
use crate::request::DataControllerRequest;
use crate::TRACING_TARGET;

/// Coordinates the memory, disk and network sources of one kind of data.
///
/// Sources are kept in Memory → Disk → Network order, which is the order
/// cascading requests and stored-data lookups walk them in.
pub struct DataController<T> {
    sources: Vec<DataSource<T>>,
}

impl<T> Default for DataController<T> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for DataController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataController")
            .field("sources", &self.origins())
            .finish()
    }
}

impl<T: Send + 'static> DataController<T> {
    /// Create a controller without sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller from a set of sources.
    pub fn from_sources(
        sources: impl IntoIterator<Item = DataSource<T>>,
    ) -> Result<Self, ControllerError> {
        sources
            .into_iter()
            .try_fold(Self::new(), |controller, source| controller.with_source(source))
    }

    /// Add a source, builder style.
    pub fn with_source(mut self, source: DataSource<T>) -> Result<Self, ControllerError> {
        self.add_source(source)?;
        Ok(self)
    }

    /// Add a source. Fails if one for the same origin is registered.
    pub fn add_source(&mut self, source: DataSource<T>) -> Result<(), ControllerError> {
        let origin = source.source_type();
        match self
            .sources
            .binary_search_by_key(&origin, |source| source.source_type())
        {
            Ok(_) => Err(ControllerError::DuplicateSource(origin)),
            Err(index) => {
                self.sources.insert(index, source);
                tracing::debug!(target: TRACING_TARGET, source = %origin, "registered source");
                Ok(())
            }
        }
    }

    /// Remove and return the source for an origin.
    pub fn remove_source(&mut self, origin: SourceType) -> Option<DataSource<T>> {
        let index = self
            .sources
            .iter()
            .position(|source| source.source_type() == origin)?;
        Some(self.sources.remove(index))
    }

    /// Get the source for an origin.
    pub fn source(&self, origin: SourceType) -> Option<&DataSource<T>> {
        self.sources
            .iter()
            .find(|source| source.source_type() == origin)
    }

    /// All sources, in Memory → Disk → Network order.
    pub fn sources(&self) -> &[DataSource<T>] {
        &self.sources
    }

    /// Origins with a registered source.
    pub fn origins(&self) -> Vec<SourceType> {
        self.sources.iter().map(|source| source.source_type()).collect()
    }

    /// Start building a request over the sources.
    pub fn request(&self) -> DataControllerRequest<T> {
        DataControllerRequest::new(self.sources.clone())
    }

    /// Check if any source has a fetch in flight.
    pub fn is_busy(&self) -> bool {
        self.sources.iter().any(DataSource::is_busy)
    }

    /// Cancel outstanding fetches on every source.
    pub fn cancel(&self) {
        for source in &self.sources {
            source.cancel();
        }
    }

    /// First stored value, looking in Memory → Disk → Network order.
    ///
    /// Default params look up each source's own default params. The
    /// response is tagged with the origin that held the value.
    pub fn stored_data(
        &self,
        params: &SourceParams,
    ) -> Result<Option<DataResponse<T>>, StorageError> {
        for source in &self.sources {
            let params = if params.is_default() {
                source.default_params()
            } else {
                params
            };
            if let Some(data) = source.stored_data_for(params)? {
                return Ok(Some(
                    DataResponse::new(data, source.source_type()).with_params(params.clone()),
                ));
            }
        }
        Ok(None)
    }

    /// Offer a response to every source's storage.
    ///
    /// Every source is tried; the first failure is returned.
    pub fn store_response(&self, response: &DataResponse<T>) -> Result<(), StorageError> {
        let mut first_error = None;
        for source in &self.sources {
            if let Err(err) = source.store(response) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Clear stored data on every source. Default params clear everything.
    ///
    /// Every source is tried; the first failure is returned.
    pub fn clear_stored_data(&self, params: &SourceParams) -> Result<(), StorageError> {
        let mut first_error = None;
        for source in &self.sources {
            if let Err(err) = source.clear_stored_data_for(params) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Persist a successful response into every source, logging failures.
pub(crate) fn merge_store<T: Send + 'static>(sources: &[DataSource<T>], response: &DataResponse<T>) {
    for source in sources {
        if let Err(err) = source.store(response) {
            tracing::warn!(
                target: TRACING_TARGET,
                source = %source.source_type(),
                from = %response.source_type,
                error = %err,
                "failed to store response"
            );
        }
    }
}
