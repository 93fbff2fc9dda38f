// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tapdiff serve`

use super::{ctrl_c, CommandError, Project};
use crate::cli::ServeArgs;
use crate::output::print_info;
use crate::server::{self, AppState};

pub async fn serve(project: &Project, args: &ServeArgs) -> Result<(), CommandError> {
    let address = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| CommandError::Bind {
            address: address.clone(),
            source,
        })?;
    print_info(format_args!(
        "Serving {} on http://{}",
        project.store.base().display(),
        listener.local_addr()?
    ));

    let state = AppState::new(project.sessions()?)
        .with_ignore_requests(project.config.ignore_requests.clone());
    server::serve(listener, state, ctrl_c()).await?;
    Ok(())
}
