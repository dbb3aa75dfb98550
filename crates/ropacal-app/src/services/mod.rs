// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: feeds the navigation host from the host runtime's inbound
// streams.
//
// `script` parses recorded sessions; `ui_loop` owns the host on a single
// task and serialises the phone, car and bridge streams onto it.

pub mod script;
pub mod ui_loop;
