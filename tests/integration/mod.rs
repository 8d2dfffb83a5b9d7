//! Integration tests exercising full policy evaluation against synthetic benchmarks.

mod scenarios;
