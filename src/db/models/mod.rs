pub mod alert_models;
pub mod device_models;
pub mod user_models;

pub use alert_models::{
    Alert, AlertRow, AlertStatus, CreateAlertRequest, GeoPoint, LocationInput, UpdateAlertRequest,
};
pub use device_models::{
    Device, DeviceFixture, DeviceFixtureEntry, DeviceStatus, UpdateDeviceRequest,
};
pub use user_models::{AuthToken, LoginCredentials, PublicUser, User};
