//! VERSION / COPYRIGHT: fixed informational output.

use async_trait::async_trait;

use crate::commands::{Command, CommandSchema, ExecContext};
use crate::error::ShellResult;

const COPYRIGHT: &str = "Copyright (c) qsh contributors.
Licensed under the Apache License, Version 2.0 (the \"License\");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at
    http://www.apache.org/licenses/LICENSE-2.0
Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an \"AS IS\" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.";

/// Version command: print the shell version.
pub struct Version;

#[async_trait]
impl Command for Version {
    fn name(&self) -> &str {
        "VERSION"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("VERSION", "Show the shell version.").example("\\VERSION;")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        let line = format!("SHELL VERSION : {}", ctx.shell_version);
        ctx.println(line);
        ctx.println("Use select version(); or select min_version(); to show the server version.");
        Ok(())
    }
}

/// Copyright command.
pub struct Copyright;

#[async_trait]
impl Command for Copyright {
    fn name(&self) -> &str {
        "COPYRIGHT"
    }

    fn schema(&self) -> CommandSchema {
        CommandSchema::new("COPYRIGHT", "Show the copyright and license notice.").example("\\COPYRIGHT;")
    }

    async fn execute(&self, _args: &[String], ctx: &mut ExecContext) -> ShellResult<()> {
        ctx.println(COPYRIGHT);
        Ok(())
    }
}
