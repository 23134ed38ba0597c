use super::endpoint::resolve_endpoint;
use super::{ResolveError, RunContext};
use crate::diagnostics::DiagnosticKind;
use crate::model::{normalize_base_route, ServiceModel};
use crate::naming::to_snake_case;
use crate::source::{is_exported, Annotation, Interface, ServiceAnnotation, SourceUnit};
use http::Method;
use std::collections::HashMap;
use tracing::{debug, info};

/// Resolve the annotated service interface of a source unit.
///
/// Returns `Ok(None)` when the unit has no interface carrying the configured
/// service annotation.
pub fn resolve_service(
    ctx: &mut RunContext,
    unit: &SourceUnit,
) -> Result<Option<ServiceModel>, ResolveError> {
    let mut annotated = unit.interfaces.iter().filter(|i| service_annotations(i).next().is_some());
    let Some(interface) = annotated.next() else {
        debug!(file = %unit.path.display(), "no service interface in source unit");
        return Ok(None);
    };
    for other in annotated {
        ctx.warn(
            other.name.clone(),
            DiagnosticKind::DuplicateAnnotation,
            format!(
                "only one service per source unit is supported, '{}' is used and '{}' is ignored",
                interface.name, other.name
            ),
        );
    }

    let annotations: Vec<&ServiceAnnotation> = service_annotations(interface).collect();
    if annotations.len() > 1 {
        ctx.warn(
            interface.name.clone(),
            DiagnosticKind::DuplicateAnnotation,
            "interface has more than one service annotation, the last one is used",
        );
    }
    let annotation = annotations.last().copied().cloned().unwrap_or_default();

    let identifier = to_snake_case(annotation.name.as_deref().unwrap_or(&interface.name));

    let has_constructor = unit.functions.iter().any(|f| {
        f.name == "New"
            && matches!(f.results.as_slice(), [only] if only.ty.qualifier == interface.name
                && only.ty.package.is_none()
                && !only.ty.array)
    });
    if !has_constructor {
        return Err(ResolveError::validation(
            &identifier,
            format!(
                "constructor 'New' returning '{}' is missing from {}",
                interface.name,
                unit.path.display()
            ),
        ));
    }

    let base_route = match &annotation.route {
        Some(route) => normalize_base_route(route),
        None => {
            ctx.warn(
                identifier.clone(),
                DiagnosticKind::MissingRoute,
                format!("no route set for service, '/{identifier}' is used"),
            );
            normalize_base_route(&identifier)
        }
    };

    let mut endpoints = Vec::new();
    for method in &interface.methods {
        let transport = method.annotations.iter().any(Annotation::is_transport);
        let exported = is_exported(&method.name);
        if !exported {
            if transport {
                ctx.warn(
                    format!("{identifier}.{}", method.name),
                    DiagnosticKind::IgnoredMethod,
                    "method is not exported and is ignored",
                );
            }
            continue;
        }
        if !transport {
            ctx.warn(
                format!("{identifier}.{}", method.name),
                DiagnosticKind::IgnoredMethod,
                "method has no http or grpc annotation and is ignored",
            );
            continue;
        }
        endpoints.push(resolve_endpoint(
            ctx,
            &identifier,
            &interface.name,
            method,
            &unit.import,
        )?);
    }

    let service = ServiceModel {
        identifier,
        base_route,
        interface: interface.name.clone(),
        package: unit.package.clone(),
        import_path: unit.import.path.clone(),
        source: unit.path.clone(),
        endpoints,
        annotations: interface.annotations.clone(),
    };
    check_service_routes(&service)?;

    info!(
        service = %service.identifier,
        base_route = %service.base_route,
        endpoints = service.endpoints.len(),
        "resolved service"
    );
    Ok(Some(service))
}

fn service_annotations(interface: &Interface) -> impl Iterator<Item = &ServiceAnnotation> {
    interface.annotations.iter().filter_map(|a| match a {
        Annotation::Service(s) => Some(s),
        _ => None,
    })
}

/// Every expanded (method, path) entry must belong to one endpoint only.
fn check_service_routes(service: &ServiceModel) -> Result<(), ResolveError> {
    let mut owners: HashMap<(Method, &str), &str> = HashMap::new();
    for endpoint in &service.endpoints {
        for (method, path) in endpoint.routes() {
            match owners.get(&(method.clone(), path)) {
                Some(&owner) if owner != endpoint.name => {
                    return Err(ResolveError::endpoint_validation(
                        &service.identifier,
                        &endpoint.name,
                        format!(
                            "route {method} {path} is declared by both '{owner}' and '{}'",
                            endpoint.name
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    owners.insert((method.clone(), path), endpoint.name.as_str());
                }
            }
        }
    }
    Ok(())
}

/// Invariants across all services resolved together: unique identifiers,
/// unique base routes and unique fully expanded routes.
pub fn check_batch<'a>(
    services: impl IntoIterator<Item = &'a ServiceModel>,
) -> Result<(), ResolveError> {
    let mut identifiers: HashMap<&str, &ServiceModel> = HashMap::new();
    let mut base_routes: HashMap<&str, &ServiceModel> = HashMap::new();
    let mut routes: HashMap<(Method, String), (&str, &str)> = HashMap::new();

    for service in services {
        if let Some(previous) = base_routes.insert(&service.base_route, service) {
            return Err(ResolveError::validation(
                &service.identifier,
                format!(
                    "base route '{}' is used by both '{}' ({}) and '{}' ({})",
                    service.base_route,
                    previous.interface,
                    previous.source.display(),
                    service.interface,
                    service.source.display()
                ),
            ));
        }
        if let Some(previous) = identifiers.insert(&service.identifier, service) {
            return Err(ResolveError::validation(
                &service.identifier,
                format!(
                    "service identifier is used by both '{}' ({}) and '{}' ({})",
                    previous.interface,
                    previous.source.display(),
                    service.interface,
                    service.source.display()
                ),
            ));
        }
        for route in service.routes() {
            let key = (route.method.clone(), route.path.clone());
            if let Some((other_service, other_endpoint)) = routes.get(&key) {
                if *other_service != service.identifier {
                    return Err(ResolveError::endpoint_validation(
                        &service.identifier,
                        route.endpoint,
                        format!(
                            "route {} {} is declared by both '{}.{}' and '{}.{}'",
                            route.method,
                            route.path,
                            other_service,
                            other_endpoint,
                            service.identifier,
                            route.endpoint
                        ),
                    ));
                }
                continue;
            }
            routes.insert(key, (service.identifier.as_str(), route.endpoint));
        }
    }
    Ok(())
}
