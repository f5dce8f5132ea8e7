//! User management module.
//!
//! CRUD on user and address records, paginated keyword search, role
//! assignment, soft delete.

mod error;
mod models;
mod repository;
mod service;

pub use error::UserError;
pub use models::{
    Address, AddressRequest, Audit, FieldViolation, Gender, Role, User, UserCreationRequest,
    UserPageResponse, UserPasswordRequest, UserResponse, UserStatus, UserType, UserUpdateRequest,
};
pub use repository::UserRepository;
pub use service::UserService;
