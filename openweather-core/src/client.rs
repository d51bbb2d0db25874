use log::debug;
use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};

use crate::{
    config::ClientConfig,
    error::WeatherError,
    request::{Location, Operation, PreparedRequest},
    response::{ResponseOutcome, classify},
    transport::{HttpTransport, Transport},
};

/// Message delivered to the completion of an aborted call.
pub const CANCELLED_MESSAGE: &str = "The request was cancelled";

/// Client for the OpenWeatherMap 2.5 API.
///
/// Every call performs exactly one GET through the configured [`Transport`]
/// and yields a single [`ResponseOutcome`]. Calls naming an empty city fail
/// with [`WeatherError::InvalidInput`] without touching the network.
#[derive(Debug, Clone)]
pub struct OpenWeather {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl OpenWeather {
    /// Client with default settings and an optional API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn units(&self) -> &str {
        &self.config.units
    }

    pub fn set_units(&mut self, units: impl Into<String>) {
        self.config.units = units.into();
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Takes effect from the next call on; the value travels with each request.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn locale(&self) -> String {
        self.config.locale()
    }

    /// Build the request `op` would send, without sending it.
    pub fn prepare(&self, op: &Operation) -> Result<PreparedRequest, WeatherError> {
        PreparedRequest::build(op, &self.config)
    }

    /// Send `op` and wait for its outcome.
    pub async fn execute(&self, op: &Operation) -> ResponseOutcome {
        let request = self.prepare(op)?;
        send(self.transport.as_ref(), &request, self.config.timeout).await
    }

    /// Send `op` in the background and hand its outcome to `completion`.
    ///
    /// `completion` runs exactly once. On [`Dispatch::Rejected`] it has
    /// already run, on the caller's thread. An accepted call that is aborted
    /// through its [`RequestHandle`] completes with a `Transport` failure
    /// carrying [`CANCELLED_MESSAGE`]. Accepted calls need a Tokio runtime;
    /// outside one the call is rejected with a transport failure.
    pub fn dispatch<F>(&self, op: Operation, completion: F) -> Dispatch
    where
        F: FnOnce(ResponseOutcome) + Send + 'static,
    {
        let request = match self.prepare(&op) {
            Ok(request) => request,
            Err(err) => {
                completion(Err(err));
                return Dispatch::Rejected;
            }
        };

        let Ok(runtime) = Handle::try_current() else {
            completion(Err(WeatherError::Transport {
                code: 0,
                message: "No Tokio runtime available to send the request".to_string(),
            }));
            return Dispatch::Rejected;
        };

        let transport = Arc::clone(&self.transport);
        let timeout = self.config.timeout;

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let task = runtime.spawn(async move {
            // A dropped handle closes the channel without cancelling.
            let outcome = tokio::select! {
                outcome = send(transport.as_ref(), &request, timeout) => outcome,
                Ok(()) = &mut cancel_rx => Err(WeatherError::Transport {
                    code: 0,
                    message: CANCELLED_MESSAGE.to_string(),
                }),
            };
            completion(outcome);
        });

        Dispatch::Accepted(RequestHandle { task, cancel: Mutex::new(Some(cancel_tx)) })
    }

    pub async fn current_weather_by_city(&self, name: &str) -> ResponseOutcome {
        self.execute(&Operation::current_weather(Location::city(name))).await
    }

    pub async fn current_weather_by_id(&self, id: u64) -> ResponseOutcome {
        self.execute(&Operation::current_weather(Location::Id(id))).await
    }

    pub async fn current_weather_by_coordinates(&self, lat: f64, lon: f64) -> ResponseOutcome {
        self.execute(&Operation::current_weather(Location::coordinates(lat, lon))).await
    }

    /// `daily` selects `forecast/daily` over the 3-hourly `forecast`.
    pub async fn forecast_by_city(&self, name: &str, daily: bool) -> ResponseOutcome {
        self.execute(&Operation::Forecast { location: Location::city(name), daily }).await
    }

    pub async fn forecast_by_id(&self, id: u64, daily: bool) -> ResponseOutcome {
        self.execute(&Operation::Forecast { location: Location::Id(id), daily }).await
    }

    pub async fn forecast_by_coordinates(&self, lat: f64, lon: f64, daily: bool) -> ResponseOutcome {
        let location = Location::coordinates(lat, lon);
        self.execute(&Operation::Forecast { location, daily }).await
    }

    /// City search with `type=like` and `sort=population`.
    ///
    /// See [`CitySearch::from_outcome`](crate::model::CitySearch::from_outcome)
    /// for decoding the result.
    pub async fn search_city(&self, name: &str) -> ResponseOutcome {
        self.execute(&Operation::search_city(name)).await
    }

    pub async fn search_city_with(
        &self,
        name: &str,
        match_type: &str,
        sort_by: &str,
    ) -> ResponseOutcome {
        self.execute(&Operation::SearchCity {
            name: name.to_string(),
            match_type: match_type.to_string(),
            sort_by: sort_by.to_string(),
        })
        .await
    }
}

async fn send(transport: &dyn Transport, request: &PreparedRequest, timeout: Duration) -> ResponseOutcome {
    debug!("sending {} request", request.endpoint);
    classify(transport.get(request, timeout).await)
}

/// Whether [`OpenWeather::dispatch`] sent the request.
#[derive(Debug)]
pub enum Dispatch {
    /// Refused before sending; the completion has already run.
    ///
    /// The delivered failure is either `InvalidInput` (see
    /// [`WeatherError::is_rejected_before_send`]) or, when no Tokio runtime
    /// was available, a `Transport` failure with code 0.
    Rejected,
    /// In flight or finished; see [`RequestHandle::is_finished`].
    Accepted(RequestHandle),
}

impl Dispatch {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Dispatch::Accepted(_))
    }

    pub fn into_handle(self) -> Option<RequestHandle> {
        match self {
            Dispatch::Accepted(handle) => Some(handle),
            Dispatch::Rejected => None,
        }
    }
}

/// Handle to an accepted background call.
pub struct RequestHandle {
    task: JoinHandle<()>,
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl RequestHandle {
    /// True once the completion has run.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the call. Unless the outcome was already delivered, the
    /// completion runs with a cancellation failure. Repeated calls are no-ops.
    pub fn abort(&self) {
        let sender = match self.cancel.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    /// Wait for the completion to run. Returns `false` if the task panicked.
    pub async fn join(self) -> bool {
        self.task.await.is_ok()
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle").field("finished", &self.is_finished()).finish()
    }
}
