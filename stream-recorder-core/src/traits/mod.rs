pub mod capture_device;
pub mod device_factory;
pub mod playback_device;
pub mod session_delegate;
