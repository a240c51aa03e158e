pub mod status_refresh_worker;
