//! Integration tests for quincy-reporter
//!
//! Uses wiremock to stand in for the crash collection server and verifies
//! delivery, retention and the wire format of uploaded reports.

mod common;

mod test_delivery;
mod test_wire_format;
