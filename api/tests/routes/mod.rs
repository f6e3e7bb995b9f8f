mod events_test;
mod health_test;
mod scanner_test;
