//! Unit tests for the screener stages
