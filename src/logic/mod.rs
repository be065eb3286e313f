// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Business logic: reading CSV exports and turning them into RDF/XML documents.

pub mod csv_processor;
pub mod csv_reader;
pub mod file_manager;
pub mod xml_generator;
