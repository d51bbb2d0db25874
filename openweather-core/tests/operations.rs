//! Typed operations against a recording transport double.

mod common;

use common::{RecordingTransport, init_logging};
use openweather_core::{
    ClientConfig, Location, OpenWeather, Operation, TransportError, WeatherError,
    client::CANCELLED_MESSAGE,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

fn client_with(transport: &Arc<RecordingTransport>) -> OpenWeather {
    init_logging();
    let config = ClientConfig::default().with_api_key("KEY").with_locale("en");
    OpenWeather::with_transport(config, transport.clone())
}

fn rome() -> serde_json::Value {
    json!({ "name": "Rome", "weather": [{ "main": "Clear", "description": "clear sky" }] })
}

#[tokio::test]
async fn empty_city_never_reaches_the_network() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let client = client_with(&transport);

    let outcomes = [
        client.current_weather_by_city("").await,
        client.forecast_by_city("", true).await,
        client.forecast_by_city("", false).await,
        client.search_city("").await,
        client.search_city_with("", "accurate", "population").await,
    ];

    for outcome in outcomes {
        let err = outcome.unwrap_err();
        assert_eq!(err, WeatherError::InvalidInput { field: "city" });
        assert!(err.is_rejected_before_send());
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn city_lookup_succeeds_with_one_call() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let client = client_with(&transport);

    let payload = client.current_weather_by_city("Rome, IT").await.expect("success");

    assert_eq!(payload["name"], "Rome");
    assert_eq!(transport.call_count(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.endpoint, "weather");
    assert_eq!(request.params.get("q"), Some("Rome, IT"));
}

#[tokio::test]
async fn unknown_city_reports_service_error() {
    let body = json!({ "message": "city not found", "cod": "404" });
    let transport = RecordingTransport::returning(Ok(Some(body)));
    let client = client_with(&transport);

    let err = client.current_weather_by_city("NoSuchPlace").await.unwrap_err();

    assert_eq!(err.code(), 404);
    assert_eq!(err.message(), "city not found");
    assert!(matches!(err, WeatherError::Service { .. }));
}

#[tokio::test]
async fn transport_timeout_is_passed_through() {
    let transport =
        RecordingTransport::returning(Err(TransportError::new("The request timed out.")));
    let client = client_with(&transport);

    let err = client.forecast_by_id(2_643_743, true).await.unwrap_err();

    assert_eq!(err, WeatherError::Transport { code: 0, message: "The request timed out.".into() });
}

#[tokio::test]
async fn empty_body_is_invalid_data() {
    let transport = RecordingTransport::returning(Ok(None));
    let client = client_with(&transport);

    let err = client.current_weather_by_id(1).await.unwrap_err();

    assert_eq!(err, WeatherError::MalformedResponse);
    assert_eq!(err.message(), "Invalid data");
}

#[tokio::test]
async fn three_hourly_forecast_at_origin() {
    let transport = RecordingTransport::returning(Ok(Some(json!({ "cod": "200", "message": 0 }))));
    let client = client_with(&transport);

    client.forecast_by_coordinates(0.0, 0.0, false).await.expect("success");

    let request = &transport.requests()[0];
    assert_eq!(request.endpoint, "forecast");
    assert_eq!(request.params.get("lat"), Some("0"));
    assert_eq!(request.params.get("lon"), Some("0"));
}

#[tokio::test]
async fn each_operation_sends_one_identifying_set() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let client = client_with(&transport);

    let _ = client.current_weather_by_id(3_169_070).await;
    let _ = client.current_weather_by_coordinates(41.89, 12.48).await;
    let _ = client.forecast_by_city("Rome", true).await;
    let _ = client.search_city("Rom").await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 4);

    let endpoints: Vec<&str> = requests.iter().map(|r| r.endpoint).collect();
    assert_eq!(endpoints, ["weather", "weather", "forecast/daily", "find"]);

    assert_eq!(requests[0].params.get("id"), Some("3169070"));
    assert!(!requests[0].params.contains_key("q"));

    assert_eq!(requests[1].params.get("lat"), Some("41.89"));
    assert_eq!(requests[1].params.get("lon"), Some("12.48"));
    assert!(!requests[1].params.contains_key("id"));

    assert_eq!(requests[2].params.get("q"), Some("Rome"));
    assert_eq!(requests[3].params.get("type"), Some("like"));
    assert_eq!(requests[3].params.get("sort"), Some("population"));

    for request in &requests {
        assert_eq!(request.params.get("APPID"), Some("KEY"));
        assert_eq!(request.params.get("lang"), Some("en"));
        assert_eq!(request.params.get("units"), Some("metric"));
    }
}

#[tokio::test]
async fn timeout_changes_apply_to_later_calls() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let mut client = client_with(&transport);

    let _ = client.current_weather_by_id(1).await;
    client.set_timeout(Duration::from_secs(2));
    let _ = client.current_weather_by_id(1).await;

    assert_eq!(transport.timeouts(), [Duration::from_secs(10), Duration::from_secs(2)]);
}

#[tokio::test]
async fn dispatch_rejects_empty_city_synchronously() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let client = client_with(&transport);
    let (tx, rx) = std::sync::mpsc::channel();

    let dispatch = client.dispatch(Operation::current_weather(Location::city("")), move |outcome| {
        tx.send(outcome).unwrap();
    });

    assert!(!dispatch.is_accepted());
    assert!(dispatch.into_handle().is_none());

    let outcome = rx.try_recv().expect("completion already ran");
    assert!(outcome.unwrap_err().is_rejected_before_send());
    assert!(rx.try_recv().is_err());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn dispatch_distinguishes_pending_from_completed() {
    let transport = RecordingTransport::gated(Ok(Some(rome())));
    let client = client_with(&transport);
    let (tx, rx) = std::sync::mpsc::channel();

    let handle = client
        .dispatch(Operation::current_weather(Location::city("Rome, IT")), move |outcome| {
            tx.send(outcome).unwrap();
        })
        .into_handle()
        .expect("accepted");

    assert!(!handle.is_finished());
    assert!(rx.try_recv().is_err());

    transport.release();
    assert!(handle.join().await);

    let payload = rx.try_recv().expect("completion ran").expect("success");
    assert_eq!(payload["name"], "Rome");
    assert!(rx.try_recv().is_err());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn aborted_dispatch_completes_once_with_cancellation() {
    let transport = RecordingTransport::gated(Ok(Some(rome())));
    let client = client_with(&transport);
    let (tx, rx) = std::sync::mpsc::channel();

    let handle = client
        .dispatch(Operation::forecast(Location::Id(1)), move |outcome| {
            tx.send(outcome).unwrap();
        })
        .into_handle()
        .expect("accepted");

    // Let the request reach the transport, where it stays blocked.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.call_count(), 1);
    assert!(!handle.is_finished());

    handle.abort();
    handle.abort();
    assert!(handle.join().await);

    let delivered: Vec<_> = rx.try_iter().collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(
        delivered[0],
        Err(WeatherError::Transport { code: 0, message: CANCELLED_MESSAGE.to_string() })
    );
}

#[tokio::test]
async fn abort_after_completion_delivers_nothing_more() {
    let transport = RecordingTransport::returning(Ok(Some(rome())));
    let client = client_with(&transport);
    let (tx, rx) = std::sync::mpsc::channel();

    let handle = client
        .dispatch(Operation::current_weather(Location::Id(1)), move |outcome| {
            tx.send(outcome).unwrap();
        })
        .into_handle()
        .expect("accepted");

    while !handle.is_finished() {
        tokio::task::yield_now().await;
    }
    handle.abort();
    assert!(handle.join().await);

    let delivered: Vec<_> = rx.try_iter().collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].as_ref().expect("success")["name"], "Rome");
}

#[tokio::test]
async fn dropping_the_handle_does_not_cancel() {
    let transport = RecordingTransport::gated(Ok(Some(rome())));
    let client = client_with(&transport);
    let (tx, rx) = tokio::sync::oneshot::channel();

    let dispatch = client.dispatch(Operation::current_weather(Location::Id(1)), move |outcome| {
        let _ = tx.send(outcome);
    });
    assert!(dispatch.is_accepted());
    drop(dispatch);

    transport.release();
    let outcome = rx.await.expect("completion ran");
    assert_eq!(outcome.expect("success")["name"], "Rome");
}
