use std::sync::Arc;

use crate::models::Entity;
use crate::repository::Repository;
use crate::services::{CourseCascade, EnrollmentService, ProfileService};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn repository<E: Entity>(&self) -> Repository<E> {
        Repository::new(self.store.clone())
    }

    pub fn cascade(&self) -> CourseCascade {
        CourseCascade::new(self.store.clone())
    }

    pub fn enrollments(&self) -> EnrollmentService {
        EnrollmentService::new(self.store.clone())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone())
    }
}
