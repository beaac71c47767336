pub mod geofence;
