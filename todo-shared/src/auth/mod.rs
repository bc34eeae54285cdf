/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password rules
/// - [`jwt`]: session token generation and validation
/// - [`middleware`]: resolving a session token into an authenticated caller
///
/// # Example
///
/// ```no_run
/// use todo_shared::auth::password::{hash_password, verify_password};
/// use todo_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "alice");
/// let token = create_token(&claims, "secret-key-of-at-least-32-bytes!!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
