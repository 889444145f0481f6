/// gRPC server implementation for the identity service
///
/// Implements all RPCs from identity.proto:
/// - Queries: GetUsers, GetUser, GetUserByUsername
/// - Mutations: CreateUser, UpdateUser, DeleteUser
/// - Authentication: AuthenticateUser
///
/// Authorization goes through the same `authz` policy as the REST adapter,
/// before any service call, so both surfaces agree on outcomes.
use crate::authz::{self, Actor, Operation};
use crate::error::IdentityError;
use crate::models::{CreateUser, PublicUser, Role, UpdateUser};
use crate::security::token::TokenIssuer;
use crate::service::users::parse_user_id;
use crate::service::UserService;
use crate::validators;
use tonic::{metadata::MetadataMap, Request, Response, Status};
use tracing::info;

// Import generated protobuf types
pub mod atrium {
    pub mod identity {
        tonic::include_proto!("atrium.identity");
    }
}

use atrium::identity::user_service_server::UserService as UserServiceRpc;
use atrium::identity::*;

/// Identity service gRPC server
#[derive(Clone)]
pub struct IdentityServiceServer {
    service: UserService,
    tokens: TokenIssuer,
}

impl IdentityServiceServer {
    pub fn new(service: UserService, tokens: TokenIssuer) -> Self {
        Self { service, tokens }
    }

    /// Resolve the caller identity from `authorization` metadata.
    ///
    /// A missing header is an anonymous caller (public RPCs proceed); a
    /// present but invalid bearer token is an error.
    async fn actor(&self, metadata: &MetadataMap) -> Result<Option<Actor>, IdentityError> {
        let Some(value) = metadata.get("authorization") else {
            return Ok(None);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or(IdentityError::Unauthenticated)?;

        let subject = self.tokens.validate(token)?;

        let user = self
            .service
            .get_user_by_username(&subject)
            .await?
            .ok_or(IdentityError::Unauthenticated)?;

        Ok(Some(Actor::from(&user)))
    }
}

fn user_to_proto(user: &PublicUser) -> User {
    User {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        created_at: user.created_at.to_rfc3339(),
    }
}

#[tonic::async_trait]
impl UserServiceRpc for IdentityServiceServer {
    /// List accounts with pagination. Admin only.
    async fn get_users(
        &self,
        request: Request<GetUsersRequest>,
    ) -> std::result::Result<Response<GetUsersResponse>, Status> {
        let actor = self.actor(request.metadata()).await?;
        authz::require(actor.as_ref(), &Operation::ListUsers)?;

        let req = request.into_inner();
        if req.skip < 0 {
            return Err(Status::invalid_argument("skip must be non-negative"));
        }
        let limit = if req.limit == 0 { 100 } else { req.limit };
        if !(1..=100).contains(&limit) {
            return Err(Status::invalid_argument("limit must be between 1 and 100"));
        }

        let users = self.service.get_users(req.skip, limit).await?;

        Ok(Response::new(GetUsersResponse {
            users: users.iter().map(user_to_proto).collect(),
        }))
    }

    /// Fetch one account by id. Admin or owner.
    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> std::result::Result<Response<UserResponse>, Status> {
        let actor = self.actor(request.metadata()).await?;
        let req = request.into_inner();

        authz::require(
            actor.as_ref(),
            &Operation::ReadUser {
                target: parse_user_id(&req.id),
            },
        )?;

        let user = self
            .service
            .get_user(&req.id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    /// Fetch one account by username. Public.
    async fn get_user_by_username(
        &self,
        request: Request<GetUserByUsernameRequest>,
    ) -> std::result::Result<Response<UserResponse>, Status> {
        let req = request.into_inner();

        let user = self
            .service
            .get_user_by_username(&req.username)
            .await?
            .ok_or(IdentityError::NotFound)?;

        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    /// Register a new account. Public.
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> std::result::Result<Response<UserResponse>, Status> {
        let req = request.into_inner();

        if !validators::validate_username(&req.username) {
            return Err(Status::invalid_argument("Invalid username format"));
        }
        if !validators::validate_email(&req.email) {
            return Err(Status::invalid_argument("Invalid email format"));
        }
        if req.password.is_empty() {
            return Err(Status::invalid_argument("Password must not be empty"));
        }

        let role = if req.role.is_empty() {
            Role::User
        } else {
            Role::from_str(&req.role)
                .ok_or_else(|| Status::invalid_argument("Invalid role"))?
        };

        let new_user = CreateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            role,
        };

        let user = self.service.create_user(&new_user).await?;

        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    /// Patch an account. Admin or owner; role changes admin only. Only
    /// fields the caller explicitly set are applied.
    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> std::result::Result<Response<UserResponse>, Status> {
        let actor = self.actor(request.metadata()).await?;
        let req = request.into_inner();

        if let Some(username) = &req.username {
            if !validators::validate_username(username) {
                return Err(Status::invalid_argument("Invalid username format"));
            }
        }
        if let Some(email) = &req.email {
            if !validators::validate_email(email) {
                return Err(Status::invalid_argument("Invalid email format"));
            }
        }
        if let Some(password) = &req.password {
            if password.is_empty() {
                return Err(Status::invalid_argument("Password must not be empty"));
            }
        }
        let role = match req.role.as_deref() {
            Some(role) => {
                Some(Role::from_str(role).ok_or_else(|| Status::invalid_argument("Invalid role"))?)
            }
            None => None,
        };

        authz::require(
            actor.as_ref(),
            &Operation::UpdateUser {
                target: parse_user_id(&req.id),
                changes_role: role.is_some(),
            },
        )?;

        let fields = UpdateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            role,
        };

        let user = self
            .service
            .update_user(&req.id, &fields)
            .await?
            .ok_or(IdentityError::NotFound)?;

        Ok(Response::new(UserResponse {
            user: Some(user_to_proto(&user)),
        }))
    }

    /// Hard-delete an account. Admin or owner.
    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> std::result::Result<Response<DeleteUserResponse>, Status> {
        let actor = self.actor(request.metadata()).await?;
        let req = request.into_inner();

        authz::require(
            actor.as_ref(),
            &Operation::DeleteUser {
                target: parse_user_id(&req.id),
            },
        )?;

        if !self.service.delete_user(&req.id).await? {
            return Err(IdentityError::NotFound.into());
        }

        Ok(Response::new(DeleteUserResponse { success: true }))
    }

    /// Verify credentials and issue a bearer token. Public.
    async fn authenticate_user(
        &self,
        request: Request<AuthenticateUserRequest>,
    ) -> std::result::Result<Response<AuthenticateUserResponse>, Status> {
        let req = request.into_inner();

        let user = self
            .service
            .authenticate_user(&req.username, &req.password)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = self.tokens.issue(&user.username)?;

        info!(username = %user.username, "Issued access token");

        Ok(Response::new(AuthenticateUserResponse {
            token,
            user: Some(user_to_proto(&user)),
        }))
    }
}
