//! Bridge between the MyEldom boiler cloud and a host-neutral sensor model.
//!
//! Start with [`eldom::EldomClient`] for login and control, drive telemetry
//! with [`telemetry::ReconnectSupervisor`], and read projected values from
//! [`projection::ProjectionBoard`].

pub mod api;
pub mod config;
pub mod eldom;
pub mod error;
pub mod projection;
pub mod shutdown;
pub mod telemetry;
