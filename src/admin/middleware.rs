// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::AuthRequest;
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Gate on the manage scope: anonymous callers get 401, authenticated
/// non-staff callers get 403. Finer grants (admin-only tag surgery, record
/// ownership) are checked per handler.
pub struct RequireStaffMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequireStaffMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireStaffMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireStaffMiddlewareService { service }))
    }
}

pub struct RequireStaffMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireStaffMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !req.request().is_staff() {
            let authenticated = req.request().is_authenticated();
            let (req, _) = req.into_parts();

            log::debug!(
                "Manage request to {} rejected ({})",
                req.path(),
                if authenticated { "not staff" } else { "anonymous" }
            );
            let response = if authenticated {
                HttpResponse::Forbidden()
                    .json(serde_json::json!({ "error": "Forbidden" }))
                    .map_into_right_body()
            } else {
                HttpResponse::Unauthorized()
                    .json(serde_json::json!({ "error": "Authentication required" }))
                    .map_into_right_body()
            };

            return Box::pin(async move { Ok(ServiceResponse::new(req, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
