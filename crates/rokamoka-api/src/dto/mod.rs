//! 请求与响应 DTO

pub mod request;
pub mod response;

pub use request::{
    AddressRequest, ArtworkRequest, CreatePermissionRequest, DecisionRequest, DeviceRequest,
    EmblemRequest, ExhibitionRequest, ImageRequest, LocationRequest, PasswordResetRequest,
    RegisterRequest,
};
pub use response::{ApiResponse, LoginResponse};
