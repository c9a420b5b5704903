pub mod analytics_aggregator;
