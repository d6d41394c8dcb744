use oso::PolarClass;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated subject behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

impl PolarClass for User {
    fn get_polar_class_builder() -> oso::ClassBuilder<User> {
        oso::Class::builder()
            .name("User")
            .add_attribute_getter("id", |recv: &User| recv.id.to_string())
    }

    fn get_polar_class() -> oso::Class {
        User::get_polar_class_builder().build()
    }
}
