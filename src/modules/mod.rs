pub mod document {
    pub mod model;
    pub mod repository;
    #[cfg(test)]
    pub mod repository_memory;
    pub mod repository_pg;
    pub mod schema;
}

pub mod post {
    pub mod handle;
    pub mod model;
    pub mod route;
    pub mod schema;
    pub mod service;
}

pub mod file_upload {
    pub mod handle;
    pub mod model;
    pub mod route;
    pub mod schema;
    pub mod service;
    pub mod storage;
}
