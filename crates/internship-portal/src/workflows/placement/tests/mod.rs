mod common;
mod projector;
mod properties;
