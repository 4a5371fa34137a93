// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


pub(crate) use instruction_parser::assemble;
