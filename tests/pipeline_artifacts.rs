use emission_watch::artifact::{
    ArtifactError, ArtifactPaths, ArtifactSet, DEFAULT_FAULT_SCALER_FILE,
    DEFAULT_INDEX_REGRESSOR_FILE,
};
use emission_watch::enrich::{
    AIR_PRESSURE_RANGE, EnvironmentEnricher, FixedEnricher, RandomEnricher, SeededEnricher,
    VEHICLE_AGE_RANGE, WIND_SPEED_RANGE,
};
use emission_watch::error::{AppError, Stage};
use emission_watch::inputs::{
    EmissionLevel, EnvironmentInputs, SynthesizedFields, TrafficCondition, VehicleSensorReading,
};
use emission_watch::pipeline::{InferencePipeline, LevelThresholds};
use emission_watch::state::AppState;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const BUNDLED_DIR: &str = "models";

const SYNTHESIZED: SynthesizedFields = SynthesizedFields {
    vehicle_age: 4,
    wind_speed: 7.5,
    air_pressure: 1013.0,
};

fn bundled_pipeline() -> Result<InferencePipeline, AppError> {
    let artifacts = ArtifactSet::load(&ArtifactPaths::in_dir(BUNDLED_DIR))?;
    Ok(InferencePipeline::new(artifacts, LevelThresholds::default()))
}

/// Copies the bundled artifacts into a fresh temp directory.
fn copy_bundled(tag: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
    let dir = std::env::temp_dir().join(format!("emission-watch-{tag}-{unique}"));
    fs::create_dir_all(&dir)?;
    for entry in fs::read_dir(BUNDLED_DIR)? {
        let entry = entry?;
        fs::copy(entry.path(), dir.join(entry.file_name()))?;
    }
    Ok(dir)
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn bundled_artifacts_produce_full_result() -> Result<(), AppError> {
    let pipeline = bundled_pipeline()?;
    let env = FixedEnricher::new(SYNTHESIZED).enrich(EnvironmentInputs::default());

    let result = pipeline.run(&VehicleSensorReading::default(), &env)?;

    assert!(!result.fault);
    for (pollutant, value) in result.pollutants.iter() {
        assert!(value >= 0.0, "{} is negative", pollutant.display_name());
    }
    assert!((result.pollutants.co2 - 195.0).abs() < 1e-9);
    assert!(result.emission_index.is_finite());
    assert!((result.emission_index - 0.2).abs() < 1e-9);
    assert_eq!(result.level, EmissionLevel::Medium);
    Ok(())
}

#[test]
fn heavy_traffic_and_large_engine_classify_high() -> Result<(), AppError> {
    let pipeline = bundled_pipeline()?;
    let inputs = EnvironmentInputs {
        engine_size: 5.0,
        traffic_condition: TrafficCondition::Heavy,
        ..EnvironmentInputs::default()
    };
    let env = FixedEnricher::new(SYNTHESIZED).enrich(inputs);

    let result = pipeline.run(&VehicleSensorReading::default(), &env)?;

    assert!((result.pollutants.co2 - 235.0).abs() < 1e-9);
    assert!((result.emission_index - 0.48).abs() < 1e-9);
    assert_eq!(result.level, EmissionLevel::High);
    Ok(())
}

#[test]
fn low_rpm_and_cold_engine_flag_a_fault() -> Result<(), AppError> {
    let pipeline = bundled_pipeline()?;
    let reading = VehicleSensorReading {
        engine_rpm: 300.0,
        lub_oil_pressure: 6.0,
        fuel_pressure: 12.0,
        coolant_pressure: 1.0,
        lub_oil_temp: 70.0,
        coolant_temp: 70.0,
    };
    let env = FixedEnricher::new(SYNTHESIZED).enrich(EnvironmentInputs::default());

    let result = pipeline.run(&reading, &env)?;

    assert!(result.fault);
    assert_eq!(result.level, EmissionLevel::Medium);
    Ok(())
}

#[test]
fn seeded_enrichment_makes_requests_repeatable() -> Result<(), AppError> {
    let first = AppState::new(bundled_pipeline()?, Box::new(SeededEnricher::new(42)));
    let second = AppState::new(bundled_pipeline()?, Box::new(SeededEnricher::new(42)));
    let reading = VehicleSensorReading::default();

    for _ in 0..3 {
        let (env_a, result_a) = first.infer(&reading, EnvironmentInputs::default());
        let (env_b, result_b) = second.infer(&reading, EnvironmentInputs::default());
        assert_eq!(env_a, env_b);
        assert_eq!(result_a?, result_b?);
    }
    Ok(())
}

#[test]
fn random_enrichment_stays_within_documented_ranges() -> Result<(), AppError> {
    let state = AppState::new(bundled_pipeline()?, Box::new(RandomEnricher));

    for _ in 0..50 {
        let (env, result) = state.infer(
            &VehicleSensorReading::default(),
            EnvironmentInputs::default(),
        );
        let fields = env.synthesized;
        assert!(VEHICLE_AGE_RANGE.contains(&fields.vehicle_age));
        assert!(WIND_SPEED_RANGE.contains(&fields.wind_speed));
        assert!(AIR_PRESSURE_RANGE.contains(&fields.air_pressure));
        assert_eq!(result?.level, EmissionLevel::Medium);
    }
    Ok(())
}

#[test]
fn scaler_fitted_on_other_column_order_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = copy_bundled("permuted")?;
    let scaler_path = dir.join(DEFAULT_FAULT_SCALER_FILE);
    let permuted = fs::read_to_string(&scaler_path)?.replacen(
        "\"Engine rpm\",\n      \"Lub oil pressure\"",
        "\"Lub oil pressure\",\n      \"Engine rpm\"",
        1,
    );
    fs::write(&scaler_path, permuted)?;

    let loaded = ArtifactSet::load(&ArtifactPaths::in_dir(&dir));
    cleanup(&dir);
    let pipeline = InferencePipeline::new(loaded?, LevelThresholds::default());
    let env = FixedEnricher::new(SYNTHESIZED).enrich(EnvironmentInputs::default());

    let result = pipeline.run(&VehicleSensorReading::default(), &env);

    assert!(matches!(
        result,
        Err(AppError::ArtifactMismatch {
            stage: Stage::Fault,
            ..
        })
    ));
    Ok(())
}

#[test]
fn missing_artifact_fails_the_whole_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = copy_bundled("missing")?;
    fs::remove_file(dir.join(DEFAULT_INDEX_REGRESSOR_FILE))?;

    let loaded = ArtifactSet::load(&ArtifactPaths::in_dir(&dir));
    cleanup(&dir);

    match loaded {
        Err(AppError::ArtifactLoad {
            artifact, source, ..
        }) => {
            assert_eq!(artifact, "index regressor");
            assert!(matches!(source, ArtifactError::Read(_)));
        }
        other => panic!("expected artifact load error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn corrupt_artifact_reports_parse_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = copy_bundled("corrupt")?;
    fs::write(dir.join(DEFAULT_FAULT_SCALER_FILE), "{\"kind\": ")?;

    let loaded = ArtifactSet::load(&ArtifactPaths::in_dir(&dir));
    cleanup(&dir);

    assert!(matches!(
        loaded,
        Err(AppError::ArtifactLoad {
            source: ArtifactError::Parse(_),
            ..
        })
    ));
    Ok(())
}
