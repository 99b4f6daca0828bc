// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod ids;
pub mod model;
pub mod notify;
pub mod resource;

pub use controller::*;
pub use error::*;
pub use forms::*;
pub use i18n::StringTable;
pub use ids::*;
pub use model::*;
pub use notify::*;
pub use resource::*;
