#![cfg(test)]

mod support;

mod alerts;
mod concurrency;
mod lifecycle;
mod plugins;
mod scan_barrier;
