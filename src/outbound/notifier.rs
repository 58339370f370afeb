pub mod graph_client;
