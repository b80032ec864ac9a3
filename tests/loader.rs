use std::io::Write;

use signalstack::config::{BackendKind, ViewerConfig};
use signalstack::data::buffer::DataSource;
use signalstack::data::loader;
use signalstack::processing::downsampling::Reduction;
use signalstack::{StackError, TimeSeriesSession, UiEvent};

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn csv_file_feeds_a_session() {
    let file = write_temp(
        ".csv",
        "time,Fp1,Fp2,EOG\n\
         ,eeg,eeg,eog\n\
         0.00,1,2,10\n\
         0.01,-1,-2,-10\n\
         0.02,1,2,10\n\
         0.03,-1,-2,-10\n",
    );
    let recording = loader::load_file(file.path(), 256.0).unwrap();
    assert_eq!(recording.channel_names(), vec!["Fp1", "Fp2", "EOG"]);
    assert!((recording.sample_rate() - 100.0).abs() < 1e-9);

    let mut session = TimeSeriesSession::default();
    session.load_dataset(&recording).unwrap();
    assert_eq!(session.registry().tags(), vec!["eeg", "eog"]);
    assert_eq!(session.scaling().vertical_step(), 100.0);

    session
        .handle_event(UiEvent::DimensionFilterChanged(Some("eeg".into())))
        .unwrap();
    assert_eq!(session.current_legend_order(), &["Fp1", "Fp2"]);
    assert_eq!(session.scaling().vertical_step(), 20.0);
}

#[test]
fn csv_without_time_column_uses_default_rate() {
    let file = write_temp(".csv", "Cz,Pz\n1,2\n3,4\n5,6\n");
    let recording = loader::load_file(file.path(), 50.0).unwrap();
    assert_eq!(recording.sample_rate(), 50.0);
    let (_, times) = recording.read(0, 3);
    assert_eq!(times, vec![0.0, 0.02, 0.04]);
}

#[test]
fn unsupported_extension_is_a_load_error() {
    let file = write_temp(".xlsx", "not really a spreadsheet");
    assert!(matches!(
        loader::load_file(file.path(), 256.0),
        Err(StackError::Load(_))
    ));
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = loader::load_file(&dir.path().join("absent.csv"), 256.0).unwrap_err();
    assert!(matches!(err, StackError::Load(_)));
}

#[test]
fn partial_config_file_keeps_defaults() {
    let file = write_temp(
        ".json",
        r#"{ "amplitude_max": 20, "backend": "direct", "reduction": "lttb" }"#,
    );
    let config = ViewerConfig::load(file.path()).unwrap();
    assert_eq!(config.amplitude_max, 20.0);
    assert_eq!(config.amplitude_min, 1.0);
    assert_eq!(config.backend, BackendKind::Direct);
    assert_eq!(config.reduction, Reduction::Lttb);
    assert_eq!(config.figure_width, 1000);

    let session = TimeSeriesSession::new(config).unwrap();
    assert_eq!(session.scaling().bounds(), (1.0, 20.0));
}

#[test]
fn invalid_config_file_is_rejected() {
    let file = write_temp(".json", r#"{ "amplitude_min": 5, "amplitude_max": 2 }"#);
    assert!(matches!(ViewerConfig::load(file.path()), Err(StackError::Config(_))));

    let file = write_temp(".json", "{ not json");
    assert!(matches!(ViewerConfig::load(file.path()), Err(StackError::Config(_))));
}
