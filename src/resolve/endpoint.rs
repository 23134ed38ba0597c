use super::{ResolveError, RunContext};
use crate::model::{Endpoint, RecordRef};
use crate::source::{Import, Method, Param};
use crate::transport::http;
use tracing::debug;

/// Resolve one interface method into an [`Endpoint`].
///
/// `owner` is the package identity of the unit declaring the interface; types
/// written without a package prefix belong to it. Any failure is reported as
/// [`ResolveError::Endpoint`] naming `Interface.Method`.
pub fn resolve_endpoint(
    ctx: &mut RunContext,
    service: &str,
    interface: &str,
    method: &Method,
    owner: &Import,
) -> Result<Endpoint, ResolveError> {
    resolve(ctx, service, method, owner).map_err(|source| ResolveError::Endpoint {
        interface: interface.to_string(),
        method: method.name.clone(),
        source: Box::new(source),
    })
}

fn resolve(
    ctx: &mut RunContext,
    service: &str,
    method: &Method,
    owner: &Import,
) -> Result<Endpoint, ResolveError> {
    let params: Vec<Param> = method.params.iter().map(|p| with_owner_import(p, owner)).collect();
    let results: Vec<Param> = method.results.iter().map(|p| with_owner_import(p, owner)).collect();

    check_params(service, &method.name, &params)?;
    check_results(service, &method.name, &results)?;

    let request = match params.get(1) {
        Some(param) => Some(RecordRef {
            ty: param.ty.clone(),
            record: ctx.resolve_type(&param.ty)?,
        }),
        None => None,
    };
    // Positional: with two results the first is the response, the second the error.
    let response = match results.as_slice() {
        [response, _] => Some(RecordRef {
            ty: response.ty.clone(),
            record: ctx.resolve_type(&response.ty)?,
        }),
        _ => None,
    };

    let http = http::bind(
        ctx.diagnostics_mut(),
        service,
        &method.name,
        &method.annotations,
        request.as_ref(),
    )?;

    debug!(
        service = %service,
        endpoint = %method.name,
        http = http.is_some(),
        "resolved endpoint"
    );

    Ok(Endpoint {
        name: method.name.clone(),
        params,
        results,
        request,
        response,
        http,
        annotations: method.annotations.clone(),
    })
}

/// Same-unit types carry no import; give them the owning package.
fn with_owner_import(param: &Param, owner: &Import) -> Param {
    let mut param = param.clone();
    if param.ty.import.is_none() && param.ty.package.is_none() && param.ty.is_exported() {
        param.ty.import = Some(owner.clone());
    }
    param
}

fn check_params(service: &str, endpoint: &str, params: &[Param]) -> Result<(), ResolveError> {
    if params.is_empty() || params.len() > 2 {
        return Err(ResolveError::endpoint_validation(
            service,
            endpoint,
            format!(
                "method must take the context and at most one request, found {} parameter(s)",
                params.len()
            ),
        ));
    }
    let ctx_ty = &params[0].ty;
    if !ctx_ty.is_context() || ctx_ty.pointer || ctx_ty.variadic || ctx_ty.array {
        return Err(ResolveError::endpoint_validation(
            service,
            endpoint,
            format!("the first parameter must be context.Context, found '{ctx_ty}'"),
        ));
    }
    if let Some(request) = params.get(1) {
        let ty = &request.ty;
        if !ty.is_exported() || ty.array || ty.variadic {
            return Err(ResolveError::endpoint_validation(
                service,
                endpoint,
                format!("the request must be an exported record type, found '{ty}'"),
            ));
        }
    }
    Ok(())
}

fn check_results(service: &str, endpoint: &str, results: &[Param]) -> Result<(), ResolveError> {
    let valid = match results {
        [err] => err.ty.is_error(),
        [response, err] => {
            err.ty.is_error()
                && response.ty.pointer
                && !response.ty.array
                && !response.ty.variadic
                && response.ty.is_exported()
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ResolveError::endpoint_validation(
            service,
            endpoint,
            "method must return either error or a pointer to an exported response record and error",
        ))
    }
}
