pub mod settings;

pub use settings::ExtValConfig;
