pub mod shared {
    pub mod infrastructure {
        pub mod key_value_store;
    }
}

pub mod modules {
    pub mod locations {
        pub mod core {
            pub mod location;
            pub mod state;
        }
        pub mod application {
            pub mod errors;
            pub mod repository;
        }
        pub mod adapters {
            pub mod outbound {
                pub mod location_collection;
            }
        }
    }
    pub mod positioning {
        pub mod core {
            pub mod errors;
            pub mod options;
            pub mod permission;
            pub mod ports;
            pub mod position;
        }
        pub mod application {
            pub mod geolocation;
            pub mod subscription;
            pub mod tracker;
        }
        pub mod adapters {
            pub mod outbound {
                pub mod scripted_position_source;
            }
        }
    }
}

pub mod shell;
