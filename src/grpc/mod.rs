//! gRPC service implementation.
//!
//! Exposes the planner over gRPC, following the teacher's
//! `OptimizerServiceImpl`-wraps-shared-state shape (see the original
//! `grpc::OptimizerServiceImpl`), generalized from a single
//! `optimize_routes` RPC to the four RPCs `RouteOptimizer` defines.

pub mod convert;

use std::sync::Arc;

use tonic::{Request, Response, Status};

pub mod proto {
    tonic::include_proto!("maritime.routing");
}

use proto::route_optimizer_server::{RouteOptimizer, RouteOptimizerServer};
use proto::*;

use crate::planner::Planner;

pub struct RouteOptimizerImpl {
    planner: Arc<Planner>,
}

impl RouteOptimizerImpl {
    pub fn new(planner: Arc<Planner>) -> Self {
        RouteOptimizerImpl { planner }
    }
}

#[tonic::async_trait]
impl RouteOptimizer for RouteOptimizerImpl {
    async fn plan_route(
        &self,
        request: Request<RouteRequest>,
    ) -> Result<Response<RouteResponse>, Status> {
        let internal_request = convert::parse_route_request(&request.into_inner())?;

        let response = self
            .planner
            .plan_route(internal_request)
            .await
            .map_err(convert::planner_error_to_status)?;

        Ok(Response::new(convert::route_response_to_proto(&response)))
    }

    async fn search_ports(
        &self,
        request: Request<SearchPortsRequest>,
    ) -> Result<Response<SearchPortsResponse>, Status> {
        let req = request.into_inner();
        let limit = if req.limit == 0 { 20 } else { req.limit as usize };
        let vessel = req.vessel.as_ref().map(convert::parse_vessel_constraints).transpose()?;

        let matches = self
            .planner
            .search_ports(&req.query, limit, req.country.as_deref(), vessel.as_ref(), req.include_inactive)
            .await
            .map_err(convert::planner_error_to_status)?;

        Ok(Response::new(SearchPortsResponse {
            matches: matches.iter().map(convert::port_match_to_proto).collect(),
        }))
    }

    async fn graph_status(
        &self,
        _request: Request<GraphStatusRequest>,
    ) -> Result<Response<GraphStatusResponse>, Status> {
        let (node_count, edge_count) = self.planner.graph_status().await;

        Ok(Response::new(GraphStatusResponse {
            node_count: node_count as u64,
            edge_count: edge_count as u64,
            last_loaded: chrono::Utc::now().to_rfc3339(),
            load_time_ms: 0,
        }))
    }

    async fn reload_graph(
        &self,
        _request: Request<ReloadGraphRequest>,
    ) -> Result<Response<ReloadGraphResponse>, Status> {
        let start = std::time::Instant::now();

        match self.planner.reload_graph().await {
            Ok(()) => {
                let (node_count, edge_count) = self.planner.graph_status().await;
                Ok(Response::new(ReloadGraphResponse {
                    success: true,
                    message: format!("loaded {node_count} nodes, {edge_count} edges"),
                    load_time_ms: start.elapsed().as_millis() as u64,
                }))
            }
            Err(e) => Ok(Response::new(ReloadGraphResponse {
                success: false,
                message: e.to_string(),
                load_time_ms: start.elapsed().as_millis() as u64,
            })),
        }
    }
}

pub fn route_optimizer_server(planner: Arc<Planner>) -> RouteOptimizerServer<RouteOptimizerImpl> {
    RouteOptimizerServer::new(RouteOptimizerImpl::new(planner))
}
