//! Unit tests for anysched's public API

mod test_fsm;
