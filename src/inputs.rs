//! Request-local input and output records for the inference pipeline.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fault scaler input columns, in fitted order.
pub const FAULT_COLUMNS: [&str; 6] = [
    "Engine rpm",
    "Lub oil pressure",
    "Fuel pressure",
    "Coolant pressure",
    "lub oil temp",
    "Coolant temp",
];

/// Placeholder target column carried by every environment record.
pub const EMISSION_INDEX_COLUMN: &str = "Emission_Index";

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(InputError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Engine sensor readings consumed by the fault stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleSensorReading {
    pub engine_rpm: f64,
    /// bar
    pub lub_oil_pressure: f64,
    /// bar
    pub fuel_pressure: f64,
    /// bar
    pub coolant_pressure: f64,
    /// °C
    pub lub_oil_temp: f64,
    /// °C
    pub coolant_temp: f64,
}

impl Default for VehicleSensorReading {
    fn default() -> Self {
        Self {
            engine_rpm: 3000.0,
            lub_oil_pressure: 2.5,
            fuel_pressure: 5.0,
            coolant_pressure: 3.0,
            lub_oil_temp: 80.0,
            coolant_temp: 90.0,
        }
    }
}

impl VehicleSensorReading {
    pub fn values(&self) -> [f64; 6] {
        [
            self.engine_rpm,
            self.lub_oil_pressure,
            self.fuel_pressure,
            self.coolant_pressure,
            self.lub_oil_temp,
            self.coolant_temp,
        ]
    }

    pub fn to_record(&self) -> Record {
        FAULT_COLUMNS
            .iter()
            .zip(self.values())
            .fold(Record::new(), |record, (column, value)| {
                record.with_number(*column, value)
            })
    }

    /// Checks the ranges accepted by the input form.
    pub fn validate(&self) -> Result<(), InputError> {
        check_range("engine_rpm", self.engine_rpm, 0.0, 10_000.0)?;
        check_range("lub_oil_pressure", self.lub_oil_pressure, 0.0, 10.0)?;
        check_range("fuel_pressure", self.fuel_pressure, 0.0, 20.0)?;
        check_range("coolant_pressure", self.coolant_pressure, 0.0, 20.0)?;
        check_range("lub_oil_temp", self.lub_oil_temp, 0.0, 150.0)?;
        check_range("coolant_temp", self.coolant_temp, 0.0, 150.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Hybrid => "Hybrid",
            FuelType::Electric => "Electric",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadType {
    Highway,
    City,
    Rural,
}

impl RoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::Highway => "Highway",
            RoadType::City => "City",
            RoadType::Rural => "Rural",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Truck,
    Bus,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Truck => "Truck",
            VehicleType::Bus => "Bus",
            VehicleType::Bike => "Bike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficCondition {
    Light,
    Moderate,
    Heavy,
}

impl TrafficCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficCondition::Light => "Light",
            TrafficCondition::Moderate => "Moderate",
            TrafficCondition::Heavy => "Heavy",
        }
    }
}

/// User-supplied part of the environment record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentInputs {
    pub fuel_type: FuelType,
    pub road_type: RoadType,
    pub vehicle_type: VehicleType,
    pub traffic_condition: TrafficCondition,
    /// litres
    pub engine_size: f64,
    /// km
    pub mileage: f64,
    /// km/h
    pub speed: f64,
    /// m/s²
    pub acceleration: f64,
    /// ambient, °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
}

impl Default for EnvironmentInputs {
    fn default() -> Self {
        Self {
            fuel_type: FuelType::Petrol,
            road_type: RoadType::Highway,
            vehicle_type: VehicleType::Car,
            traffic_condition: TrafficCondition::Light,
            engine_size: 3.0,
            mileage: 150_000.0,
            speed: 60.0,
            acceleration: 3.0,
            temperature: 25.0,
            humidity: 50.0,
        }
    }
}

impl EnvironmentInputs {
    pub fn validate(&self) -> Result<(), InputError> {
        check_range("engine_size", self.engine_size, 0.0, 15.0)?;
        check_range("mileage", self.mileage, 0.0, 1_000_000.0)?;
        check_range("speed", self.speed, 0.0, 200.0)?;
        check_range("acceleration", self.acceleration, 0.0, 20.0)?;
        check_range("temperature", self.temperature, -50.0, 60.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        Ok(())
    }
}

/// Fields the fitted preprocessors expect but the user does not provide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedFields {
    /// years
    pub vehicle_age: u32,
    /// m/s
    pub wind_speed: f64,
    /// hPa
    pub air_pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentRecord {
    pub inputs: EnvironmentInputs,
    pub synthesized: SynthesizedFields,
}

impl EnvironmentRecord {
    pub fn new(inputs: EnvironmentInputs, synthesized: SynthesizedFields) -> Self {
        Self {
            inputs,
            synthesized,
        }
    }

    /// Tabular form, including the zeroed `Emission_Index` placeholder.
    pub fn to_record(&self) -> Record {
        let inputs = &self.inputs;
        let synthesized = &self.synthesized;
        Record::new()
            .with_category("Vehicle Type", inputs.vehicle_type.as_str())
            .with_category("Fuel Type", inputs.fuel_type.as_str())
            .with_number("Engine Size", inputs.engine_size)
            .with_number("Age of Vehicle", f64::from(synthesized.vehicle_age))
            .with_number("Mileage", inputs.mileage)
            .with_number("Speed", inputs.speed)
            .with_number("Acceleration", inputs.acceleration)
            .with_category("Road Type", inputs.road_type.as_str())
            .with_category("Traffic Conditions", inputs.traffic_condition.as_str())
            .with_number("Temperature", inputs.temperature)
            .with_number("Humidity", inputs.humidity)
            .with_number("Wind Speed", synthesized.wind_speed)
            .with_number("Air Pressure", synthesized.air_pressure)
            .with_number(EMISSION_INDEX_COLUMN, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollutant {
    Co2,
    Nox,
    Pm25,
    Voc,
    So2,
}

impl Pollutant {
    /// Regressor output order.
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Co2,
        Pollutant::Nox,
        Pollutant::Pm25,
        Pollutant::Voc,
        Pollutant::So2,
    ];

    pub const UNIT: &'static str = "g/km";

    pub fn display_name(&self) -> &'static str {
        match self {
            Pollutant::Co2 => "CO₂ Emissions",
            Pollutant::Nox => "NOx Emissions",
            Pollutant::Pm25 => "PM2.5 Emissions",
            Pollutant::Voc => "VOC Emissions",
            Pollutant::So2 => "SO₂ Emissions",
        }
    }

    /// Column name expected by the index preprocessor.
    pub fn index_column(&self) -> &'static str {
        match self {
            Pollutant::Co2 => "CO2 Emissions",
            Pollutant::Nox => "NOx Emissions",
            Pollutant::Pm25 => "PM2.5 Emissions",
            Pollutant::Voc => "VOC Emissions",
            Pollutant::So2 => "SO2 Emissions",
        }
    }
}

/// Predicted pollutant quantities in g/km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmissionEstimate {
    pub co2: f64,
    pub nox: f64,
    pub pm25: f64,
    pub voc: f64,
    pub so2: f64,
}

impl EmissionEstimate {
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [co2, nox, pm25, voc, so2] => Some(Self {
                co2: *co2,
                nox: *nox,
                pm25: *pm25,
                voc: *voc,
                so2: *so2,
            }),
            _ => None,
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Co2 => self.co2,
            Pollutant::Nox => self.nox,
            Pollutant::Pm25 => self.pm25,
            Pollutant::Voc => self.voc,
            Pollutant::So2 => self.so2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        Pollutant::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    /// Tabular form under the index preprocessor's column names.
    pub fn to_record(&self) -> Record {
        self.iter().fold(Record::new(), |record, (pollutant, value)| {
            record.with_number(pollutant.index_column(), value)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceResult {
    pub fault: bool,
    pub pollutants: EmissionEstimate,
    pub emission_index: f64,
    pub level: EmissionLevel,
}
