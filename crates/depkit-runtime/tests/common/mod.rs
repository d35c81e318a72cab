//! Shared fakes for provisioning integration tests.

#![allow(dead_code)]

pub mod fakes;
